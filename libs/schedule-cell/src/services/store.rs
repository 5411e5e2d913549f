use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StorageError, SupabaseClient};

use crate::models::{
    Break, CreateBreakRequest, CreateVacationRequest, DoctorSchedule, ScheduleError,
    UpsertScheduleRequest, Vacation, WeeklySchedule,
};

/// Pure data access for a doctor's weekly template, breaks and
/// vacations. Availability computation lives elsewhere; this store only
/// validates template invariants at the write boundary. Schedule edits
/// are rare and low-contention, so writes are plain last-writer-wins.
pub struct ScheduleStore {
    supabase: Arc<SupabaseClient>,
}

impl ScheduleStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Fetch the full schedule aggregate for a doctor.
    pub async fn get_schedule(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<DoctorSchedule, ScheduleError> {
        debug!("Fetching schedule for doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctor_schedules?doctor_id=eq.{}", doctor_id);
        let rows: Vec<WeeklySchedule> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        let template = rows
            .into_iter()
            .next()
            .ok_or(ScheduleError::ScheduleNotFound(doctor_id))?;

        let path = format!(
            "/rest/v1/doctor_breaks?doctor_id=eq.{}&order=start_time.asc",
            doctor_id
        );
        let breaks: Vec<Break> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        let path = format!(
            "/rest/v1/doctor_vacations?doctor_id=eq.{}&order=start_date.asc",
            doctor_id
        );
        let vacations: Vec<Vacation> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(DoctorSchedule {
            template,
            breaks,
            vacations,
        })
    }

    /// Replace a doctor's weekly template wholesale. Partial patches are
    /// deliberately not offered: the template is validated as a unit so
    /// an edit can never leave it half-consistent.
    pub async fn upsert_schedule(
        &self,
        doctor_id: Uuid,
        request: UpsertScheduleRequest,
        auth_token: Option<&str>,
    ) -> Result<WeeklySchedule, ScheduleError> {
        debug!("Upserting schedule for doctor: {}", doctor_id);

        validate_template(&request)?;

        let schedule_data = json!({
            "doctor_id": doctor_id,
            "slot_duration_minutes": request.slot_duration_minutes,
            "working_days": request.working_days,
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static(
                "resolution=merge-duplicates,return=representation",
            ),
        );

        let rows: Vec<WeeklySchedule> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_schedules?on_conflict=doctor_id",
                auth_token,
                Some(schedule_data),
                Some(headers),
            )
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            StorageError::Unexpected {
                status: 200,
                body: "empty upsert response".to_string(),
            }
            .into()
        })
    }

    pub async fn add_break(
        &self,
        doctor_id: Uuid,
        request: CreateBreakRequest,
        auth_token: Option<&str>,
    ) -> Result<Break, ScheduleError> {
        debug!("Adding break for doctor {} on {}", doctor_id, request.day);

        if request.start_time >= request.end_time {
            return Err(ScheduleError::Validation(
                "Break start time must be before end time".to_string(),
            ));
        }

        let break_data = json!({
            "doctor_id": doctor_id,
            "day": request.day,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "reason": request.reason
        });

        let rows: Vec<Break> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_breaks",
                auth_token,
                Some(break_data),
                Some(return_representation()),
            )
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            StorageError::Unexpected {
                status: 201,
                body: "empty insert response".to_string(),
            }
            .into()
        })
    }

    pub async fn remove_break(
        &self,
        break_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(), ScheduleError> {
        debug!("Removing break: {}", break_id);

        let path = format!("/rest/v1/doctor_breaks?id=eq.{}", break_id);
        let _: Vec<Break> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                auth_token,
                None,
                Some(return_representation()),
            )
            .await?;

        Ok(())
    }

    pub async fn add_vacation(
        &self,
        doctor_id: Uuid,
        request: CreateVacationRequest,
        auth_token: Option<&str>,
    ) -> Result<Vacation, ScheduleError> {
        debug!(
            "Adding vacation for doctor {}: {} - {}",
            doctor_id, request.start_date, request.end_date
        );

        if request.start_date > request.end_date {
            return Err(ScheduleError::Validation(
                "Vacation start date must not be after end date".to_string(),
            ));
        }

        let vacation_data = json!({
            "doctor_id": doctor_id,
            "start_date": request.start_date,
            "end_date": request.end_date,
            "reason": request.reason
        });

        let rows: Vec<Vacation> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_vacations",
                auth_token,
                Some(vacation_data),
                Some(return_representation()),
            )
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            StorageError::Unexpected {
                status: 201,
                body: "empty insert response".to_string(),
            }
            .into()
        })
    }

    pub async fn remove_vacation(
        &self,
        vacation_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(), ScheduleError> {
        debug!("Removing vacation: {}", vacation_id);

        let path = format!("/rest/v1/doctor_vacations?id=eq.{}", vacation_id);
        let _: Vec<Vacation> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                auth_token,
                None,
                Some(return_representation()),
            )
            .await?;

        Ok(())
    }
}

fn return_representation() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

/// Template invariants: positive slot duration, exactly one entry per
/// weekday, start before end on every working day.
fn validate_template(request: &UpsertScheduleRequest) -> Result<(), ScheduleError> {
    if request.slot_duration_minutes <= 0 {
        return Err(ScheduleError::Validation(
            "Slot duration must be a positive number of minutes".to_string(),
        ));
    }

    if request.working_days.len() != 7 {
        return Err(ScheduleError::Validation(
            "Weekly template must contain exactly one entry per weekday".to_string(),
        ));
    }

    let mut seen = [false; 7];
    for entry in &request.working_days {
        let idx = entry.day.num_days_from_monday() as usize;
        if seen[idx] {
            return Err(ScheduleError::Validation(format!(
                "Duplicate weekday entry: {}",
                entry.day
            )));
        }
        seen[idx] = true;

        if entry.is_working && entry.start_time >= entry.end_time {
            return Err(ScheduleError::Validation(format!(
                "Start time must be before end time on {}",
                entry.day
            )));
        }
    }

    Ok(())
}
