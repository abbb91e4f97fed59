// libs/appointment-cell/src/services/queue.rs
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use schedule_cell::services::engine::SchedulingEngine;
use shared_database::HospitalStore;
use shared_models::scheduling::{Appointment, ScheduleBlock};

use crate::models::{AppointmentError, QueueEntry};

/// Span the queue is drawn from: a whole block, or a single slot when the
/// instant lies outside every block.
struct QueueWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
    block: Option<ScheduleBlock>,
}

impl QueueWindow {
    fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at < self.end
    }
}

/// A doctor's waiting list for one block.
pub struct AppointmentQueueService {
    store: Arc<dyn HospitalStore>,
    engine: SchedulingEngine,
}

impl AppointmentQueueService {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self {
            engine: SchedulingEngine::new(store.clone()),
            store,
        }
    }

    pub async fn queue_for(
        &self,
        doctor_id: Uuid,
        reference: Option<NaiveDateTime>,
    ) -> Result<Vec<QueueEntry>, AppointmentError> {
        self.queue_for_at(doctor_id, reference, Local::now().naive_local()).await
    }

    /// Queue relative to an explicit "now".
    pub async fn queue_for_at(
        &self,
        doctor_id: Uuid,
        reference: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<Vec<QueueEntry>, AppointmentError> {
        let active: Vec<Appointment> = self
            .store
            .appointments_for_doctor(doctor_id)
            .await?
            .into_iter()
            .filter(Appointment::is_active)
            .collect();

        let Some(anchor) = self.find_anchor(doctor_id, &active, reference, now).await? else {
            debug!("Doctor {} has no active appointments to queue", doctor_id);
            return Ok(Vec::new());
        };

        let window = self.resolve_window(doctor_id, anchor).await?;

        let mut waiting: Vec<Appointment> = active
            .into_iter()
            .filter(|a| window.contains(a.appointment_time))
            .collect();
        waiting.sort_by(|a, b| {
            a.appointment_time
                .cmp(&b.appointment_time)
                .then(a.created_at.cmp(&b.created_at))
        });

        let mut queue = Vec::with_capacity(waiting.len());
        for (position, appointment) in waiting.into_iter().enumerate() {
            let patient = self
                .store
                .find_patient(appointment.patient_id)
                .await
                .unwrap_or_else(|e| {
                    warn!("Patient lookup failed for {}: {}", appointment.patient_id, e);
                    None
                });

            queue.push(QueueEntry {
                appointment_id: appointment.id,
                patient_id: appointment.patient_id,
                appointment_time: appointment.appointment_time,
                status: appointment.status,
                notes: appointment.notes,
                queue_position: position,
                patient_name: patient.as_ref().and_then(|p| p.name.clone()),
                patient_phone: patient.as_ref().and_then(|p| p.phone.clone()),
            });
        }

        Ok(queue)
    }

    /// Picks the instant whose window becomes the queue.
    ///
    /// 1. The reference's own window, if it holds active appointments.
    /// 2. The same weekly block on the date of the active appointment in that
    ///    block closest to the reference.
    /// 3. The earliest active appointment from `now` on, else the latest one.
    async fn find_anchor(
        &self,
        doctor_id: Uuid,
        active: &[Appointment],
        reference: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, AppointmentError> {
        if let Some(reference) = reference {
            let window = self.resolve_window(doctor_id, reference).await?;
            if active.iter().any(|a| window.contains(a.appointment_time)) {
                return Ok(Some(window.start));
            }

            if let Some(block) = &window.block {
                let closest = active
                    .iter()
                    .filter(|a| block.covers(a.appointment_time))
                    .min_by_key(|a| (a.appointment_time - reference).num_milliseconds().abs());
                if let Some(appointment) = closest {
                    return Ok(Some(appointment.appointment_time.date().and_time(block.start_time)));
                }
            }
        }

        let upcoming = active
            .iter()
            .filter(|a| a.appointment_time >= now)
            .map(|a| a.appointment_time)
            .min();

        Ok(upcoming.or_else(|| active.iter().map(|a| a.appointment_time).max()))
    }

    async fn resolve_window(&self, doctor_id: Uuid, at: NaiveDateTime) -> Result<QueueWindow, AppointmentError> {
        Ok(match self.engine.find_block_containing(doctor_id, at).await? {
            Some(block) => {
                let (start, end) = block.span_on(at.date());
                QueueWindow { start, end, block: Some(block) }
            }
            None => QueueWindow {
                start: at,
                end: at + Duration::minutes(self.engine.rules().slot_minutes),
                block: None,
            },
        })
    }
}
