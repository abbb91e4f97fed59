// libs/schedule-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        // Block management (admin)
        .route("/", post(handlers::create_block))
        .route("/{block_id}", put(handlers::update_block).delete(handlers::delete_block))

        // Doctor timetable queries
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_schedule))
        .route("/doctors/{doctor_id}/slots", get(handlers::get_doctor_slots))
        .route("/doctors/{doctor_id}/coverage", get(handlers::get_doctor_coverage))
        .route("/available-dates", get(handlers::get_available_dates))

        // Adjustment requests
        .route("/adjustments", post(handlers::submit_adjustment).get(handlers::list_adjustments))
        .route("/adjustments/mine", get(handlers::list_my_adjustments))
        .route("/adjustments/{request_id}/approve", post(handlers::approve_adjustment))
        .route("/adjustments/{request_id}/reject", post(handlers::reject_adjustment))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
