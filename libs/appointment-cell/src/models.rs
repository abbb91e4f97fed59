// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use schedule_cell::models::ScheduleError;
use shared_models::scheduling::{Appointment, AppointmentStatus};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_time: NaiveDateTime,
    pub notes: Option<String>,
    /// Refreshes the stored patient contact when present and different.
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub doctor_id: Uuid,
    pub appointment_time: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    /// Required when an admin asks for another doctor's queue.
    pub doctor_id: Option<Uuid>,
    pub appointment_time: Option<NaiveDateTime>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// Appointment enriched with directory data for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor_name: String,
    pub doctor_title: Option<String>,
    pub department_id: Option<Uuid>,
    pub department_name: Option<String>,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
}

/// One patient waiting in a doctor's block. `queue_position` counts the
/// entries ahead of this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_time: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub queue_position: usize,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub doctor_id: Uuid,
    pub appointment_time: NaiveDateTime,
    pub has_conflict: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<ScheduleError> for AppointmentError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(msg) => AppointmentError::Validation(msg),
            ScheduleError::NotFound(msg) => AppointmentError::NotFound(msg),
            ScheduleError::InvalidState(msg) => AppointmentError::InvalidState(msg),
            ScheduleError::Database(msg) => AppointmentError::Database(msg),
        }
    }
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::Database(err.to_string())
    }
}
