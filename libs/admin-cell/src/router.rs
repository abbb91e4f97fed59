// libs/admin-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get},
    middleware,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn admin_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        // Statistics
        .route("/stats/overview", get(handlers::get_overview_stats))
        .route("/stats/departments", get(handlers::get_department_stats))
        .route("/stats/daily", get(handlers::get_daily_stats))
        .route("/stats/workload", get(handlers::get_doctor_workload))

        // Directory
        .route(
            "/departments",
            get(handlers::list_departments).post(handlers::create_department),
        )
        .route("/departments/{department_id}/doctors", get(handlers::list_department_doctors))
        .route("/doctors", get(handlers::list_doctors).post(handlers::create_doctor))
        .route("/doctors/{doctor_id}", delete(handlers::delete_doctor))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
