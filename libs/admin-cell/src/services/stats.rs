// libs/admin-cell/src/services/stats.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_database::HospitalStore;
use shared_models::scheduling::{Appointment, AppointmentStatus};

use crate::models::{
    AdminError, DailyAppointmentStat, DateRangeQuery, DepartmentStat, DoctorWorkload, OverviewStats,
};

fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// Resolves an optional range against `today`. Both ends are inclusive.
pub fn resolve_range(range: DateRangeQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AdminError> {
    let end = range.end_date.unwrap_or(today);
    let start = range.start_date.unwrap_or(today - Duration::days(6));

    if start > end {
        return Err(AdminError::Validation(
            "Start date cannot be later than end date".to_string(),
        ));
    }

    Ok((start, end))
}

/// Read-only aggregations over the appointment and directory tables.
pub struct AdminStatsService {
    store: Arc<dyn HospitalStore>,
}

impl AdminStatsService {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self { store }
    }

    pub async fn overview_stats(&self) -> Result<OverviewStats, AdminError> {
        self.overview_stats_at(Local::now().date_naive()).await
    }

    #[instrument(skip(self))]
    pub async fn overview_stats_at(&self, today: NaiveDate) -> Result<OverviewStats, AdminError> {
        let tomorrow = day_start(today + Duration::days(1));
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);

        let todays = self.store.appointments_between(day_start(today), tomorrow).await?;
        let week = self.store.appointments_between(day_start(monday), tomorrow).await?;

        Ok(OverviewStats {
            total_patients: self.store.count_patients().await?,
            total_doctors: self.store.doctors().await?.len() as u64,
            total_departments: self.store.departments().await?.len() as u64,
            todays_appointments: todays.len() as u64,
            week_appointments: week.len() as u64,
            pending_appointments: self
                .store
                .count_appointments_with_status(AppointmentStatus::Pending)
                .await?,
        })
    }

    pub async fn department_stats(&self, range: DateRangeQuery) -> Result<Vec<DepartmentStat>, AdminError> {
        self.department_stats_at(range, Local::now().date_naive()).await
    }

    pub async fn department_stats_at(
        &self,
        range: DateRangeQuery,
        today: NaiveDate,
    ) -> Result<Vec<DepartmentStat>, AdminError> {
        let appointments = self.appointments_in(range, today).await?;

        let doctors = self.store.doctors().await?;
        let department_of: HashMap<Uuid, Uuid> = doctors
            .iter()
            .filter_map(|d| d.department_id.map(|dept| (d.id, dept)))
            .collect();

        let mut appointment_counts: HashMap<Uuid, u64> = HashMap::new();
        for appointment in &appointments {
            if let Some(dept) = department_of.get(&appointment.doctor_id) {
                *appointment_counts.entry(*dept).or_default() += 1;
            }
        }

        let mut stats = Vec::new();
        for department in self.store.departments().await? {
            let doctor_count = doctors
                .iter()
                .filter(|d| d.department_id == Some(department.id))
                .count() as u64;

            stats.push(DepartmentStat {
                department_id: department.id,
                appointment_count: appointment_counts.get(&department.id).copied().unwrap_or(0),
                department_name: department.name,
                description: department.description,
                doctor_count,
            });
        }

        Ok(stats)
    }

    pub async fn daily_appointment_stats(&self, range: DateRangeQuery) -> Result<Vec<DailyAppointmentStat>, AdminError> {
        self.daily_appointment_stats_at(range, Local::now().date_naive()).await
    }

    /// One entry per date in the range, including days without appointments.
    pub async fn daily_appointment_stats_at(
        &self,
        range: DateRangeQuery,
        today: NaiveDate,
    ) -> Result<Vec<DailyAppointmentStat>, AdminError> {
        let (start, end) = resolve_range(range, today)?;
        let appointments = self
            .store
            .appointments_between(day_start(start), day_start(end + Duration::days(1)))
            .await?;

        let mut by_date: HashMap<NaiveDate, DailyAppointmentStat> = HashMap::new();
        for appointment in &appointments {
            let date = appointment.appointment_time.date();
            let entry = by_date.entry(date).or_insert_with(|| DailyAppointmentStat {
                date,
                ..Default::default()
            });
            entry.total += 1;
            match appointment.status {
                AppointmentStatus::Pending => entry.pending += 1,
                AppointmentStatus::Confirmed => entry.confirmed += 1,
                AppointmentStatus::Completed => entry.completed += 1,
                AppointmentStatus::Cancelled => entry.cancelled += 1,
                AppointmentStatus::Expired => {}
            }
        }

        Ok(start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| {
                by_date.remove(&date).unwrap_or(DailyAppointmentStat {
                    date,
                    ..Default::default()
                })
            })
            .collect())
    }

    pub async fn doctor_workload(&self, range: DateRangeQuery) -> Result<Vec<DoctorWorkload>, AdminError> {
        self.doctor_workload_at(range, Local::now().date_naive()).await
    }

    pub async fn doctor_workload_at(
        &self,
        range: DateRangeQuery,
        today: NaiveDate,
    ) -> Result<Vec<DoctorWorkload>, AdminError> {
        let appointments = self.appointments_in(range, today).await?;

        let department_names: HashMap<Uuid, String> = self
            .store
            .departments()
            .await?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();

        let workloads = self
            .store
            .doctors()
            .await?
            .into_iter()
            .map(|doctor| {
                let own: Vec<&Appointment> = appointments
                    .iter()
                    .filter(|a| a.doctor_id == doctor.id)
                    .collect();

                DoctorWorkload {
                    doctor_id: doctor.id,
                    department_name: doctor
                        .department_id
                        .and_then(|id| department_names.get(&id).cloned()),
                    department_id: doctor.department_id,
                    doctor_name: doctor.name,
                    total_appointments: own.len() as u64,
                    completed_appointments: own
                        .iter()
                        .filter(|a| a.status == AppointmentStatus::Completed)
                        .count() as u64,
                    pending_appointments: own
                        .iter()
                        .filter(|a| {
                            matches!(a.status, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
                        })
                        .count() as u64,
                }
            })
            .collect();

        Ok(workloads)
    }

    async fn appointments_in(&self, range: DateRangeQuery, today: NaiveDate) -> Result<Vec<Appointment>, AdminError> {
        let (start, end) = resolve_range(range, today)?;
        debug!("Loading appointments from {} through {}", start, end);
        Ok(self
            .store
            .appointments_between(day_start(start), day_start(end + Duration::days(1)))
            .await?)
    }
}
