use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    Break, CreateBreakRequest, CreateVacationRequest, DayAvailability, DoctorSchedule,
    UpsertScheduleRequest, Vacation, WeeklySchedule,
};
use crate::services::{availability::AvailabilityService, store::ScheduleStore};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

// Availability is readable without a session (patients browse slots
// before signing in), so the bearer token is optional here.
#[axum::debug_handler]
pub async fn get_day_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<DayAvailability>, AppError> {
    let service = AvailabilityService::new(&state);

    let availability = service
        .get_day_availability(
            doctor_id,
            query.date,
            bearer.as_ref().map(|TypedHeader(auth)| auth.token()),
        )
        .await?;

    Ok(Json(availability))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<DoctorSchedule>, AppError> {
    let store = ScheduleStore::new(&state);

    let schedule = store
        .get_schedule(doctor_id, Some(bearer.token()))
        .await?;

    Ok(Json(schedule))
}

#[axum::debug_handler]
pub async fn upsert_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpsertScheduleRequest>,
) -> Result<Json<WeeklySchedule>, AppError> {
    let store = ScheduleStore::new(&state);

    let schedule = store
        .upsert_schedule(doctor_id, request, Some(bearer.token()))
        .await?;

    Ok(Json(schedule))
}

#[axum::debug_handler]
pub async fn add_break(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateBreakRequest>,
) -> Result<Json<Break>, AppError> {
    let store = ScheduleStore::new(&state);

    let created = store
        .add_break(doctor_id, request, Some(bearer.token()))
        .await?;

    Ok(Json(created))
}

#[axum::debug_handler]
pub async fn remove_break(
    State(state): State<Arc<AppConfig>>,
    Path((_doctor_id, break_id)): Path<(Uuid, Uuid)>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = ScheduleStore::new(&state);

    store.remove_break(break_id, Some(bearer.token())).await?;

    Ok(Json(serde_json::json!({ "deleted": break_id })))
}

#[axum::debug_handler]
pub async fn add_vacation(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateVacationRequest>,
) -> Result<Json<Vacation>, AppError> {
    let store = ScheduleStore::new(&state);

    let created = store
        .add_vacation(doctor_id, request, Some(bearer.token()))
        .await?;

    Ok(Json(created))
}

#[axum::debug_handler]
pub async fn remove_vacation(
    State(state): State<Arc<AppConfig>>,
    Path((_doctor_id, vacation_id)): Path<(Uuid, Uuid)>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = ScheduleStore::new(&state);

    store
        .remove_vacation(vacation_id, Some(bearer.token()))
        .await?;

    Ok(Json(serde_json::json!({ "deleted": vacation_id })))
}
