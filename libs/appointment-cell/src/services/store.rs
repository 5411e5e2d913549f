use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StorageError, SupabaseClient};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, NewAppointment};

/// Appointment persistence, keyed by `(doctor_id, date, start_time)`.
///
/// `insert` is the single enforcement point against double-booking: the
/// `appointments` table has a partial unique index over that key for
/// occupying statuses, so of N concurrent inserts for the same slot the
/// database lets exactly one through and the rest come back as 409 /
/// `Conflict`. No application-level read-then-write is involved.
pub struct AppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All appointments for a doctor on a date, ascending by start time.
    pub async fn get_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments for doctor {} on {}", doctor_id, date);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&order=start_time.asc",
            doctor_id, date
        );

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(appointments)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    pub async fn insert(
        &self,
        new: &NewAppointment,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Inserting appointment for doctor {} on {} at {}",
            new.doctor_id, new.date, new.start_time
        );

        let appointment_data = json!({
            "doctor_id": new.doctor_id,
            "patient_id": new.patient_id,
            "date": new.date,
            "start_time": new.start_time.format("%H:%M:%S").to_string(),
            "end_time": new.end_time.format("%H:%M:%S").to_string(),
            "status": new.status,
            "is_teleconsultation": new.is_teleconsultation,
            "reason": new.reason,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                auth_token,
                Some(appointment_data),
                Some(headers),
            )
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            AppointmentError::Storage(StorageError::Unexpected {
                status: 201,
                body: "empty insert response".to_string(),
            })
        })
    }

    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment {} to {}", appointment_id, new_status);

        let update_data = json!({
            "status": new_status,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(update_data),
                Some(headers),
            )
            .await?;

        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }
}
