// libs/admin-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use schedule_cell::models::ScheduleError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Optional inclusive date range. Missing bounds default to the last seven
/// days ending today.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub department_id: Uuid,
}

// ==============================================================================
// STATISTICS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_patients: u64,
    pub total_doctors: u64,
    pub total_departments: u64,
    pub todays_appointments: u64,
    pub week_appointments: u64,
    pub pending_appointments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentStat {
    pub department_id: Uuid,
    pub department_name: String,
    pub description: Option<String>,
    pub doctor_count: u64,
    pub appointment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyAppointmentStat {
    pub date: NaiveDate,
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorWorkload {
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub department_id: Option<Uuid>,
    pub department_name: Option<String>,
    pub total_appointments: u64,
    pub completed_appointments: u64,
    /// PENDING and CONFIRMED together.
    pub pending_appointments: u64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<ScheduleError> for AdminError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(msg) => AdminError::Validation(msg),
            ScheduleError::NotFound(msg) => AdminError::NotFound(msg),
            ScheduleError::InvalidState(msg) => AdminError::InvalidState(msg),
            ScheduleError::Database(msg) => AdminError::Database(msg),
        }
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        AdminError::Database(err.to_string())
    }
}
