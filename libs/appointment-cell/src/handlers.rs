use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{Appointment, BookAppointmentRequest, UpdateStatusRequest};
use crate::services::{
    booking::BookingService, lifecycle::AppointmentLifecycleService, store::AppointmentStore,
};

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let service = BookingService::new(&state);

    let appointment = service.book(request, Some(bearer.token())).await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AppointmentListQuery>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let store = AppointmentStore::new(&state);

    let appointments = store
        .get_appointments(query.doctor_id, query.date, Some(bearer.token()))
        .await?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Appointment>, AppError> {
    let store = AppointmentStore::new(&state);

    let appointment = store
        .get_appointment(appointment_id, Some(bearer.token()))
        .await?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(bearer): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    let service = AppointmentLifecycleService::new(&state);

    let appointment = service
        .transition(appointment_id, request.status, Some(bearer.token()))
        .await?;

    Ok(Json(appointment))
}
