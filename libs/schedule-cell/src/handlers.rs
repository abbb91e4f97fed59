// libs/schedule-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_admin, require_role};

use crate::models::{
    AdjustmentDecision, AvailableDatesQuery, CreateBlockRequest, ScheduleError, SlotsQuery,
    SubmitAdjustmentRequest, UpdateBlockRequest,
};
use crate::services::adjustment::AdjustmentWorkflow;
use crate::services::engine::SchedulingEngine;

pub fn map_schedule_error(err: ScheduleError) -> AppError {
    match err {
        ScheduleError::Validation(msg) => AppError::ValidationError(msg),
        ScheduleError::NotFound(msg) => AppError::NotFound(msg),
        ScheduleError::InvalidState(msg) => AppError::Conflict(msg),
        ScheduleError::Database(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// SCHEDULE BLOCK HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_block(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBlockRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let engine = SchedulingEngine::new(state.store.clone());
    let block = engine.create_block(request).await.map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Schedule created",
        "data": block
    })))
}

#[axum::debug_handler]
pub async fn update_block(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(block_id): Path<Uuid>,
    Json(request): Json<UpdateBlockRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let engine = SchedulingEngine::new(state.store.clone());
    let block = engine.update_block(block_id, request).await.map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Schedule updated",
        "data": block
    })))
}

#[axum::debug_handler]
pub async fn delete_block(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(block_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let engine = SchedulingEngine::new(state.store.clone());
    engine.delete_block(block_id).await.map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Schedule deleted",
        "data": null
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_schedule(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::new(state.store.clone());
    let schedule = engine.weekly_schedule(doctor_id).await.map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": schedule
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::new(state.store.clone());
    let slots = engine
        .slots_for_date(doctor_id, query.date)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": slots
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_coverage(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::new(state.store.clone());
    let coverage = engine.coverage(doctor_id).await.map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": coverage
    })))
}

#[axum::debug_handler]
pub async fn get_available_dates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableDatesQuery>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::new(state.store.clone());
    let dates = engine
        .available_dates(query.department_id, query.doctor_id, query.start_date, query.end_date)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": dates
    })))
}

// ==============================================================================
// ADJUSTMENT REQUEST HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn submit_adjustment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<SubmitAdjustmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let doctor_id = match (user.role, request.doctor_id) {
        (Role::Doctor, None) => user.id,
        (Role::Doctor, Some(id)) if id == user.id => id,
        (Role::Doctor, Some(_)) => {
            return Err(AppError::Forbidden(
                "Doctors may only request changes to their own schedule".to_string(),
            ))
        }
        (_, Some(id)) => id,
        (_, None) => {
            return Err(AppError::BadRequest("doctor_id is required".to_string()))
        }
    };

    let workflow = AdjustmentWorkflow::new(state.store.clone());
    let adjustment = workflow
        .submit(doctor_id, request)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Adjustment request submitted",
        "data": adjustment
    })))
}

#[axum::debug_handler]
pub async fn list_adjustments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let workflow = AdjustmentWorkflow::new(state.store.clone());
    let requests = workflow.all_requests().await.map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": requests
    })))
}

#[axum::debug_handler]
pub async fn list_my_adjustments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor])?;

    let workflow = AdjustmentWorkflow::new(state.store.clone());
    let requests = workflow
        .requests_for_doctor(user.id)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": requests
    })))
}

#[axum::debug_handler]
pub async fn approve_adjustment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(request_id): Path<Uuid>,
    decision: Option<Json<AdjustmentDecision>>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let Json(decision) = decision.unwrap_or_default();

    let workflow = AdjustmentWorkflow::new(state.store.clone());
    let adjustment = workflow
        .approve(request_id, decision.response_text)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Adjustment request approved",
        "data": adjustment
    })))
}

#[axum::debug_handler]
pub async fn reject_adjustment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(request_id): Path<Uuid>,
    decision: Option<Json<AdjustmentDecision>>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let Json(decision) = decision.unwrap_or_default();

    let workflow = AdjustmentWorkflow::new(state.store.clone());
    let adjustment = workflow
        .reject(request_id, decision.response_text)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Adjustment request rejected",
        "data": adjustment
    })))
}
