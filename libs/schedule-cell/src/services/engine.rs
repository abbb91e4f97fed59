// libs/schedule-cell/src/services/engine.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::HospitalStore;
use shared_models::scheduling::{DayOfWeek, ScheduleBlock};

use crate::models::{
    CoverageReport, CreateBlockRequest, ScheduleError, ScheduleView, SchedulingRules, Slot,
    UpdateBlockRequest,
};
use crate::services::{capacity, resolver};

const UNKNOWN_DOCTOR: &str = "Unknown doctor";

/// Owns schedule blocks and answers every "when can this doctor see
/// patients" question.
pub struct SchedulingEngine {
    store: Arc<dyn HospitalStore>,
    rules: SchedulingRules,
}

impl SchedulingEngine {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self::with_rules(store, SchedulingRules::default())
    }

    pub fn with_rules(store: Arc<dyn HospitalStore>, rules: SchedulingRules) -> Self {
        Self { store, rules }
    }

    pub fn rules(&self) -> &SchedulingRules {
        &self.rules
    }

    // ==========================================================================
    // BLOCK MANAGEMENT
    // ==========================================================================

    pub async fn create_block(&self, request: CreateBlockRequest) -> Result<ScheduleBlock, ScheduleError> {
        if request.end_time <= request.start_time {
            return Err(ScheduleError::Validation(
                "End time must be later than start time".to_string(),
            ));
        }

        let length = request.end_time - request.start_time;
        if length != Duration::minutes(self.rules.block_minutes) {
            return Err(ScheduleError::Validation(format!(
                "Each working block must last exactly {} minutes",
                self.rules.block_minutes
            )));
        }

        let max_patients = request.max_patients.unwrap_or(self.rules.default_max_patients);
        if max_patients == 0 {
            return Err(ScheduleError::Validation(
                "Max patients must be a positive number".to_string(),
            ));
        }

        let existing = self
            .store
            .blocks_for_doctor_on(request.doctor_id, request.day_of_week)
            .await?;
        if existing
            .iter()
            .any(|b| b.same_slot_as(request.day_of_week, request.start_time, request.end_time))
        {
            return Err(ScheduleError::Validation(
                "A schedule already exists for this time block".to_string(),
            ));
        }

        let now = Utc::now();
        let block = ScheduleBlock {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            max_patients,
            created_at: now,
            updated_at: now,
        };

        let block = self.store.insert_block(block).await?;
        info!(
            "Created schedule block {} for doctor {} on {} {}-{}",
            block.id, block.doctor_id, block.day_of_week, block.start_time, block.end_time
        );
        Ok(block)
    }

    /// Overwrites day and times as given. Length and duplicate rules are only
    /// enforced on creation.
    pub async fn update_block(&self, id: Uuid, request: UpdateBlockRequest) -> Result<ScheduleBlock, ScheduleError> {
        let mut block = self
            .store
            .find_block(id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound("Schedule not found".to_string()))?;

        block.day_of_week = request.day_of_week;
        block.start_time = request.start_time;
        block.end_time = request.end_time;
        if let Some(max_patients) = request.max_patients {
            if max_patients == 0 {
                return Err(ScheduleError::Validation(
                    "Max patients must be a positive number".to_string(),
                ));
            }
            block.max_patients = max_patients;
        }
        block.updated_at = Utc::now();

        let block = self.store.save_block(block).await?;
        debug!("Updated schedule block {}", block.id);
        Ok(block)
    }

    /// Appointments already booked against the block are left untouched.
    pub async fn delete_block(&self, id: Uuid) -> Result<(), ScheduleError> {
        if !self.store.delete_block(id).await? {
            return Err(ScheduleError::NotFound("Schedule not found".to_string()));
        }
        info!("Deleted schedule block {}", id);
        Ok(())
    }

    pub async fn remove_doctor_schedule(&self, doctor_id: Uuid) -> Result<usize, ScheduleError> {
        let removed = self.store.delete_blocks_for_doctor(doctor_id).await?;
        info!("Removed {} schedule blocks of doctor {}", removed, doctor_id);
        Ok(removed)
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn blocks_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<ScheduleBlock>, ScheduleError> {
        Ok(self.store.blocks_for_doctor(doctor_id).await?)
    }

    /// Weekly timetable, ordered by weekday then start time.
    pub async fn weekly_schedule(&self, doctor_id: Uuid) -> Result<Vec<ScheduleView>, ScheduleError> {
        let blocks = self.store.blocks_for_doctor(doctor_id).await?;

        let doctor_name = match self.store.find_doctor(doctor_id).await {
            Ok(Some(doctor)) => doctor.name,
            Ok(None) => UNKNOWN_DOCTOR.to_string(),
            Err(e) => {
                warn!("Doctor lookup failed for {}: {}", doctor_id, e);
                UNKNOWN_DOCTOR.to_string()
            }
        };

        Ok(blocks
            .into_iter()
            .map(|block| ScheduleView { block, doctor_name: doctor_name.clone() })
            .collect())
    }

    pub async fn find_block_containing(
        &self,
        doctor_id: Uuid,
        at: NaiveDateTime,
    ) -> Result<Option<ScheduleBlock>, ScheduleError> {
        let blocks = self
            .store
            .blocks_for_doctor_on(doctor_id, DayOfWeek::of(at.date()))
            .await?;
        Ok(resolver::find_block_containing(&blocks, at.time()).cloned())
    }

    /// Every 30-minute slot of every block on `date`. Each slot carries the
    /// occupancy of its whole block.
    pub async fn slots_for_date(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Slot>, ScheduleError> {
        let blocks = self
            .store
            .blocks_for_doctor_on(doctor_id, DayOfWeek::of(date))
            .await?;

        let mut slots = Vec::new();
        for block in &blocks {
            let current = capacity::block_occupancy(&*self.store, block, date).await?;
            let available = current < block.max_patients;

            for (start_time, end_time) in resolver::partition_block(block, date, self.rules.slot_minutes) {
                slots.push(Slot {
                    start_time,
                    end_time,
                    current_patients: current,
                    max_patients: block.max_patients,
                    available,
                    is_working_time: true,
                });
            }
        }

        Ok(slots)
    }

    pub async fn is_within_working_hours(&self, doctor_id: Uuid, at: NaiveDateTime) -> Result<bool, ScheduleError> {
        Ok(self.find_block_containing(doctor_id, at).await?.is_some())
    }

    /// Occupancy of the block enclosing `at`; zero outside working hours.
    pub async fn current_occupancy(&self, doctor_id: Uuid, at: NaiveDateTime) -> Result<u32, ScheduleError> {
        match self.find_block_containing(doctor_id, at).await? {
            Some(block) => capacity::block_occupancy(&*self.store, &block, at.date()).await,
            None => Ok(0),
        }
    }

    /// Outside working hours there is no capacity to exhaust, so this is false.
    pub async fn is_slot_full(&self, doctor_id: Uuid, at: NaiveDateTime) -> Result<bool, ScheduleError> {
        match self.find_block_containing(doctor_id, at).await? {
            Some(block) => {
                let current = capacity::block_occupancy(&*self.store, &block, at.date()).await?;
                Ok(capacity::is_full(current, block.max_patients))
            }
            None => Ok(false),
        }
    }

    pub async fn has_minimum_weekly_coverage(&self, doctor_id: Uuid) -> Result<bool, ScheduleError> {
        Ok(self.coverage(doctor_id).await?.has_minimum_coverage)
    }

    pub async fn coverage(&self, doctor_id: Uuid) -> Result<CoverageReport, ScheduleError> {
        let block_count = self.store.blocks_for_doctor(doctor_id).await?.len();
        Ok(CoverageReport {
            doctor_id,
            block_count,
            has_minimum_coverage: block_count >= self.rules.minimum_weekly_blocks,
        })
    }

    /// Dates in `[start_date, end_date]` on which the doctor, or any doctor of
    /// the department when none is given, has a block with spare capacity.
    pub async fn available_dates(
        &self,
        department_id: Uuid,
        doctor_id: Option<Uuid>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>, ScheduleError> {
        if end_date < start_date {
            return Err(ScheduleError::Validation(
                "End date cannot be earlier than start date".to_string(),
            ));
        }
        if (end_date - start_date).num_days() >= self.rules.max_search_days {
            return Err(ScheduleError::Validation(format!(
                "Date range cannot exceed {} days",
                self.rules.max_search_days
            )));
        }

        let doctor_ids: Vec<Uuid> = match doctor_id {
            Some(id) => vec![id],
            None => self
                .store
                .doctors_in_department(department_id)
                .await?
                .into_iter()
                .map(|d| d.id)
                .collect(),
        };

        if doctor_ids.is_empty() {
            debug!("Department {} has no doctors", department_id);
            return Ok(Vec::new());
        }

        let mut dates = Vec::new();
        for date in start_date.iter_days().take_while(|d| *d <= end_date) {
            if self.any_open_block(&doctor_ids, date).await? {
                dates.push(date);
            }
        }

        Ok(dates)
    }

    async fn any_open_block(&self, doctor_ids: &[Uuid], date: NaiveDate) -> Result<bool, ScheduleError> {
        let day = DayOfWeek::of(date);
        for doctor_id in doctor_ids {
            for block in self.store.blocks_for_doctor_on(*doctor_id, day).await? {
                let current = capacity::block_occupancy(&*self.store, &block, date).await?;
                if current < block.max_patients {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
