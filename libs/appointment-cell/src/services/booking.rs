// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use schedule_cell::services::capacity;
use schedule_cell::services::engine::SchedulingEngine;
use shared_database::{AppState, HospitalStore, SlotLocks};
use shared_models::scheduling::{Appointment, AppointmentStatus};

use crate::models::{AppointmentDetails, AppointmentError, BookAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycleService;

const UNKNOWN_DOCTOR: &str = "Unknown doctor";

pub struct AppointmentBookingService {
    store: Arc<dyn HospitalStore>,
    slot_locks: Arc<SlotLocks>,
    engine: SchedulingEngine,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self::with_parts(state.store.clone(), state.slot_locks.clone())
    }

    pub fn with_parts(store: Arc<dyn HospitalStore>, slot_locks: Arc<SlotLocks>) -> Self {
        Self {
            engine: SchedulingEngine::new(store.clone()),
            store,
            slot_locks,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    /// Books a pending appointment inside one of the doctor's blocks.
    ///
    /// The doctor's day stays locked from block resolution until the insert
    /// is stored.
    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id, patient_id = %request.patient_id))]
    pub async fn book_appointment(&self, request: BookAppointmentRequest) -> Result<Appointment, AppointmentError> {
        let at = request.appointment_time;

        let appointment = {
            let _guard = self.slot_locks.lock(request.doctor_id, at.date()).await;

            let block = self
                .engine
                .find_block_containing(request.doctor_id, at)
                .await?
                .ok_or_else(outside_working_hours)?;

            let current = capacity::block_occupancy(&*self.store, &block, at.date()).await?;
            if capacity::is_full(current, block.max_patients) {
                warn!(
                    "Block {} on {} is full ({}/{})",
                    block.id, at.date(), current, block.max_patients
                );
                return Err(AppointmentError::Validation(
                    "This time slot is full, please choose another time".to_string(),
                ));
            }

            let now = Utc::now();
            let appointment = Appointment {
                id: Uuid::new_v4(),
                patient_id: request.patient_id,
                doctor_id: request.doctor_id,
                appointment_time: at,
                status: AppointmentStatus::Pending,
                notes: request.notes.clone(),
                created_at: now,
                updated_at: now,
            };

            self.store.insert_appointment(appointment).await?
        };

        info!("Booked appointment {} at {}", appointment.id, appointment.appointment_time);

        if let Err(e) = self.update_patient_contact(&request).await {
            warn!("Patient contact update failed for {}: {}", request.patient_id, e);
        }

        Ok(appointment)
    }

    /// Returns whether the stored patient row changed.
    async fn update_patient_contact(&self, request: &BookAppointmentRequest) -> anyhow::Result<bool> {
        let Some(mut patient) = self.store.find_patient(request.patient_id).await? else {
            return Ok(false);
        };

        let mut updated = false;
        if let Some(name) = non_blank(&request.patient_name) {
            if patient.name.as_deref() != Some(name) {
                patient.name = Some(name.to_string());
                updated = true;
            }
        }
        if let Some(phone) = non_blank(&request.patient_phone) {
            if patient.phone.as_deref() != Some(phone) {
                patient.phone = Some(phone.to_string());
                updated = true;
            }
        }

        if updated {
            patient.updated_at = Utc::now();
            self.store.save_patient(patient).await?;
            debug!("Updated contact details of patient {}", request.patient_id);
        }

        Ok(updated)
    }

    // ==========================================================================
    // LIFECYCLE
    // ==========================================================================

    /// The reason replaces any earlier notes.
    pub async fn cancel_appointment(&self, id: Uuid, reason: Option<String>) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.get_appointment(id).await?;
        self.lifecycle_service
            .validate_status_transition(appointment.status, AppointmentStatus::Cancelled)?;

        appointment.status = AppointmentStatus::Cancelled;
        appointment.notes = reason;
        appointment.updated_at = Utc::now();

        let appointment = self.store.save_appointment(appointment).await?;
        info!("Cancelled appointment {}", appointment.id);
        Ok(appointment)
    }

    pub async fn confirm_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(id, AppointmentStatus::Confirmed).await
    }

    pub async fn complete_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(id, AppointmentStatus::Completed).await
    }

    async fn transition(&self, id: Uuid, target: AppointmentStatus) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.get_appointment(id).await?;
        self.lifecycle_service
            .validate_status_transition(appointment.status, target)?;

        appointment.status = target;
        appointment.updated_at = Utc::now();

        let appointment = self.store.save_appointment(appointment).await?;
        info!("Appointment {} is now {}", appointment.id, appointment.status);
        Ok(appointment)
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .find_appointment(id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound("Appointment not found".to_string()))
    }

    /// Whether the block containing `at` has no capacity left.
    pub async fn check_conflict(&self, doctor_id: Uuid, at: NaiveDateTime) -> Result<bool, AppointmentError> {
        Ok(self.engine.is_slot_full(doctor_id, at).await?)
    }

    /// Start times of the open, in-hours slots on `date`.
    pub async fn available_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<NaiveDateTime>, AppointmentError> {
        let slots = self.engine.slots_for_date(doctor_id, date).await?;
        Ok(slots
            .into_iter()
            .filter(|slot| slot.available && slot.is_working_time)
            .map(|slot| slot.start_time)
            .collect())
    }

    pub async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let appointments = self.store.appointments_for_patient(patient_id).await?;
        self.with_details(appointments).await
    }

    pub async fn appointments_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let appointments = self.store.appointments_for_doctor(doctor_id).await?;
        self.with_details(appointments).await
    }

    /// Directory lookups here are decoration; a failed lookup leaves the
    /// field empty instead of failing the listing.
    async fn with_details(&self, appointments: Vec<Appointment>) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let mut details = Vec::with_capacity(appointments.len());

        for appointment in appointments {
            let doctor = self.store.find_doctor(appointment.doctor_id).await.unwrap_or_else(|e| {
                warn!("Doctor lookup failed for {}: {}", appointment.doctor_id, e);
                None
            });

            let department_name = match doctor.as_ref().and_then(|d| d.department_id) {
                Some(department_id) => self
                    .store
                    .find_department(department_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|d| d.name),
                None => None,
            };

            let patient = self.store.find_patient(appointment.patient_id).await.unwrap_or_else(|e| {
                warn!("Patient lookup failed for {}: {}", appointment.patient_id, e);
                None
            });

            details.push(AppointmentDetails {
                doctor_name: doctor
                    .as_ref()
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| UNKNOWN_DOCTOR.to_string()),
                doctor_title: doctor.as_ref().and_then(|d| d.title.clone()),
                department_id: doctor.as_ref().and_then(|d| d.department_id),
                department_name,
                patient_name: patient.as_ref().and_then(|p| p.name.clone()),
                patient_phone: patient.as_ref().and_then(|p| p.phone.clone()),
                appointment,
            });
        }

        Ok(details)
    }
}

fn outside_working_hours() -> AppointmentError {
    AppointmentError::Validation(
        "The requested time is outside the doctor's working hours".to_string(),
    )
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
