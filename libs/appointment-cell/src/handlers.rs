// libs/appointment-cell/src/handlers.rs
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
use shared_models::scheduling::Appointment;
use shared_utils::extractor::{require_role, require_self_or_admin};

use crate::models::{
    AppointmentError, AvailableSlotsQuery, BookAppointmentRequest, CancelAppointmentRequest,
    ConflictCheckQuery, ConflictCheckResponse, QueueQuery,
};
use crate::services::booking::AppointmentBookingService;
use crate::services::queue::AppointmentQueueService;

pub fn map_appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::Validation(msg) => AppError::ValidationError(msg),
        AppointmentError::NotFound(msg) => AppError::NotFound(msg),
        AppointmentError::InvalidState(msg) => AppError::Conflict(msg),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

fn ensure_participant(user: &User, appointment: &Appointment) -> Result<(), AppError> {
    if user.is_admin() || user.id == appointment.patient_id || user.id == appointment.doctor_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized to access this appointment".to_string()))
    }
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    // patients book for themselves, admins for anyone
    if !(user.is_admin() || (user.is_patient() && user.id == request.patient_id)) {
        return Err(AppError::Forbidden(
            "Not authorized to book appointment for this patient".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .book_appointment(request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment booked",
        "data": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    ensure_participant(&user, &appointment)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": appointment
    })))
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    request: Option<Json<CancelAppointmentRequest>>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;
    ensure_participant(&user, &appointment)?;

    let appointment = booking_service
        .cancel_appointment(appointment_id, request.reason)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled",
        "data": appointment
    })))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;
    ensure_participant(&user, &appointment)?;

    let appointment = booking_service
        .confirm_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment confirmed",
        "data": appointment
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;
    ensure_participant(&user, &appointment)?;

    let appointment = booking_service
        .complete_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment completed",
        "data": appointment
    })))
}

// ==============================================================================
// LISTING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_self_or_admin(&user, patient_id)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .appointments_for_patient(patient_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_self_or_admin(&user, doctor_id)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .appointments_for_doctor(doctor_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": appointments
    })))
}

// ==============================================================================
// UTILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn check_appointment_conflicts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let has_conflict = booking_service
        .check_conflict(query.doctor_id, query.appointment_time)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": ConflictCheckResponse {
            doctor_id: query.doctor_id,
            appointment_time: query.appointment_time,
            has_conflict,
        }
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let slots = booking_service
        .available_slots(query.doctor_id, query.date)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": slots
    })))
}

#[axum::debug_handler]
pub async fn get_appointment_queue(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let doctor_id = match (user.role, query.doctor_id) {
        (Role::Doctor, _) => user.id,
        (_, Some(id)) => id,
        (_, None) => return Err(AppError::BadRequest("doctor_id is required".to_string())),
    };

    let queue_service = AppointmentQueueService::new(state.store.clone());
    let queue = queue_service
        .queue_for(doctor_id, query.appointment_time)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "data": queue
    })))
}
