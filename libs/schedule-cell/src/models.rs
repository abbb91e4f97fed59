// libs/schedule-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::scheduling::{DayOfWeek, ScheduleBlock};

// ==============================================================================
// RULES
// ==============================================================================

/// Fixed scheduling constants shared by every service in the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingRules {
    pub block_minutes: i64,
    pub slot_minutes: i64,
    pub default_max_patients: u32,
    pub minimum_weekly_blocks: usize,
    /// Longest inclusive range `available_dates` will scan.
    pub max_search_days: i64,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            block_minutes: 120,
            slot_minutes: 30,
            default_max_patients: 10,
            minimum_weekly_blocks: 2,
            max_search_days: 366,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlockRequest {
    pub doctor_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_patients: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBlockRequest {
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_patients: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAdjustmentRequest {
    /// Only admins may file on behalf of another doctor.
    pub doctor_id: Option<Uuid>,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjustmentDecision {
    pub response_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AvailableDatesQuery {
    pub department_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// A 30-minute bookable interval inside a schedule block on a concrete date.
/// Occupancy is that of the whole enclosing block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub current_patients: u32,
    pub max_patients: u32,
    pub available: bool,
    pub is_working_time: bool,
}

/// Block as shown on a doctor's weekly timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleView {
    #[serde(flatten)]
    pub block: ScheduleBlock,
    pub doctor_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub doctor_id: Uuid,
    pub block_count: usize,
    pub has_minimum_coverage: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ScheduleError {
    fn from(err: anyhow::Error) -> Self {
        ScheduleError::Database(err.to_string())
    }
}
