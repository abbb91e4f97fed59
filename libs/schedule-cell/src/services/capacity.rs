// libs/schedule-cell/src/services/capacity.rs
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use shared_database::HospitalStore;
use shared_models::scheduling::{Appointment, ScheduleBlock};

use crate::models::ScheduleError;

/// Active appointments in `[start, end)` are the ones that hold capacity.
pub fn count_active(appointments: &[Appointment]) -> u32 {
    appointments.iter().filter(|a| a.is_active()).count() as u32
}

pub async fn count_active_in(
    store: &dyn HospitalStore,
    doctor_id: Uuid,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<u32, ScheduleError> {
    let appointments = store
        .appointments_for_doctor_between(doctor_id, start, end)
        .await?;
    Ok(count_active(&appointments))
}

/// Occupancy of `block` on `date`, counted over its full span.
pub async fn block_occupancy(
    store: &dyn HospitalStore,
    block: &ScheduleBlock,
    date: NaiveDate,
) -> Result<u32, ScheduleError> {
    let (start, end) = block.span_on(date);
    count_active_in(store, block.doctor_id, start, end).await
}

/// A block with no capacity never reports itself full.
pub fn is_full(current: u32, max_patients: u32) -> bool {
    max_patients > 0 && current >= max_patients
}
