use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Slot availability (public; identity comes from the auth layer
        // when present and is simply forwarded to storage)
        .route("/{doctor_id}/availability", get(handlers::get_day_availability))
        // Weekly template management
        .route("/{doctor_id}/schedule", get(handlers::get_schedule))
        .route("/{doctor_id}/schedule", put(handlers::upsert_schedule))
        // Recurring breaks
        .route("/{doctor_id}/breaks", post(handlers::add_break))
        .route("/{doctor_id}/breaks/{break_id}", delete(handlers::remove_break))
        // Vacations
        .route("/{doctor_id}/vacations", post(handlers::add_vacation))
        .route("/{doctor_id}/vacations/{vacation_id}", delete(handlers::remove_vacation))
        .with_state(state)
}
