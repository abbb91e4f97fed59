// libs/admin-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{AdminError, CreateDepartmentRequest, CreateDoctorRequest, DateRangeQuery};
use crate::services::directory::DirectoryService;
use crate::services::stats::AdminStatsService;

pub fn map_admin_error(err: AdminError) -> AppError {
    match err {
        AdminError::Validation(msg) => AppError::ValidationError(msg),
        AdminError::NotFound(msg) => AppError::NotFound(msg),
        AdminError::InvalidState(msg) => AppError::Conflict(msg),
        AdminError::Database(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// STATISTICS HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_overview_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let stats = AdminStatsService::new(state.store.clone())
        .overview_stats()
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": stats
    })))
}

#[axum::debug_handler]
pub async fn get_department_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let stats = AdminStatsService::new(state.store.clone())
        .department_stats(range)
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": stats
    })))
}

#[axum::debug_handler]
pub async fn get_daily_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let stats = AdminStatsService::new(state.store.clone())
        .daily_appointment_stats(range)
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": stats
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_workload(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let workload = AdminStatsService::new(state.store.clone())
        .doctor_workload(range)
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": workload
    })))
}

// ==============================================================================
// DIRECTORY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let department = DirectoryService::new(state.store.clone())
        .create_department(request)
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Department created",
        "data": department
    })))
}

#[axum::debug_handler]
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let departments = DirectoryService::new(state.store.clone())
        .departments()
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": departments
    })))
}

#[axum::debug_handler]
pub async fn list_department_doctors(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(department_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctors = DirectoryService::new(state.store.clone())
        .doctors_in_department(department_id)
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": doctors
    })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctor = DirectoryService::new(state.store.clone())
        .create_doctor(request)
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor created",
        "data": doctor
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctors = DirectoryService::new(state.store.clone())
        .doctors()
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": doctors
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    DirectoryService::new(state.store.clone())
        .delete_doctor(doctor_id)
        .await
        .map_err(map_admin_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted",
        "data": null
    })))
}
