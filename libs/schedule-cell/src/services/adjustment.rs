// libs/schedule-cell/src/services/adjustment.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use shared_database::HospitalStore;
use shared_models::scheduling::{AdjustmentRequest, AdjustmentStatus};

use crate::models::{CreateBlockRequest, ScheduleError, SubmitAdjustmentRequest};
use crate::services::engine::SchedulingEngine;

/// Doctor-initiated schedule changes, decided once by an admin.
pub struct AdjustmentWorkflow {
    store: Arc<dyn HospitalStore>,
    engine: SchedulingEngine,
}

impl AdjustmentWorkflow {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self {
            engine: SchedulingEngine::new(store.clone()),
            store,
        }
    }

    /// Stored as submitted. Block rules are checked on approval.
    pub async fn submit(
        &self,
        doctor_id: Uuid,
        request: SubmitAdjustmentRequest,
    ) -> Result<AdjustmentRequest, ScheduleError> {
        let now = Utc::now();
        let adjustment = AdjustmentRequest {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            reason: request.reason,
            status: AdjustmentStatus::Pending,
            admin_response: None,
            created_at: now,
            updated_at: now,
        };

        let adjustment = self.store.insert_request(adjustment).await?;
        info!("Doctor {} submitted adjustment request {}", doctor_id, adjustment.id);
        Ok(adjustment)
    }

    /// Creates the proposed block, then marks the request approved. A block
    /// rule violation leaves the request pending.
    pub async fn approve(
        &self,
        id: Uuid,
        response_text: Option<String>,
    ) -> Result<AdjustmentRequest, ScheduleError> {
        let mut adjustment = self.pending_request(id).await?;

        let block = self
            .engine
            .create_block(CreateBlockRequest {
                doctor_id: adjustment.doctor_id,
                day_of_week: adjustment.day_of_week,
                start_time: adjustment.start_time,
                end_time: adjustment.end_time,
                max_patients: None,
            })
            .await?;

        adjustment.status = AdjustmentStatus::Approved;
        adjustment.admin_response = response_text;
        adjustment.updated_at = Utc::now();

        match self.store.save_request(adjustment).await {
            Ok(saved) => {
                info!("Approved adjustment request {} as block {}", saved.id, block.id);
                Ok(saved)
            }
            Err(e) => {
                error!("Failed to mark request {} approved, removing block {}: {}", id, block.id, e);
                if let Err(cleanup) = self.store.delete_block(block.id).await {
                    error!("Failed to remove block {}: {}", block.id, cleanup);
                }
                Err(e.into())
            }
        }
    }

    pub async fn reject(
        &self,
        id: Uuid,
        response_text: Option<String>,
    ) -> Result<AdjustmentRequest, ScheduleError> {
        let mut adjustment = self.pending_request(id).await?;

        adjustment.status = AdjustmentStatus::Rejected;
        adjustment.admin_response = response_text;
        adjustment.updated_at = Utc::now();

        let saved = self.store.save_request(adjustment).await?;
        info!("Rejected adjustment request {}", saved.id);
        Ok(saved)
    }

    pub async fn requests_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AdjustmentRequest>, ScheduleError> {
        Ok(self.store.requests_for_doctor(doctor_id).await?)
    }

    pub async fn all_requests(&self) -> Result<Vec<AdjustmentRequest>, ScheduleError> {
        Ok(self.store.all_requests().await?)
    }

    async fn pending_request(&self, id: Uuid) -> Result<AdjustmentRequest, ScheduleError> {
        let adjustment = self
            .store
            .find_request(id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound("Adjustment request not found".to_string()))?;

        if adjustment.status != AdjustmentStatus::Pending {
            return Err(ScheduleError::InvalidState(
                "Request has already been processed".to_string(),
            ));
        }

        Ok(adjustment)
    }
}
