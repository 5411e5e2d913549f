use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub booking_auto_confirm: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            booking_auto_confirm: false,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            booking_auto_confirm: self.booking_auto_confirm,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST rows in the shapes the scheduling cells deserialize.
pub struct MockClinicResponses;

impl MockClinicResponses {
    pub fn day_hours(day: &str, is_working: bool, start: &str, end: &str) -> Value {
        json!({
            "day": day,
            "is_working": is_working,
            "start_time": start,
            "end_time": end
        })
    }

    /// Mon-Fri working, weekend off.
    pub fn default_working_days(start: &str, end: &str) -> Value {
        json!([
            Self::day_hours("Mon", true, start, end),
            Self::day_hours("Tue", true, start, end),
            Self::day_hours("Wed", true, start, end),
            Self::day_hours("Thu", true, start, end),
            Self::day_hours("Fri", true, start, end),
            Self::day_hours("Sat", false, "00:00:00", "00:00:01"),
            Self::day_hours("Sun", false, "00:00:00", "00:00:01"),
        ])
    }

    pub fn schedule_response(doctor_id: &str, slot_minutes: i32, working_days: Value) -> Value {
        json!({
            "doctor_id": doctor_id,
            "slot_duration_minutes": slot_minutes,
            "working_days": working_days,
            "updated_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn break_response(doctor_id: &str, day: &str, start: &str, end: &str, reason: Option<&str>) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "day": day,
            "start_time": start,
            "end_time": end,
            "reason": reason
        })
    }

    pub fn vacation_response(doctor_id: &str, start_date: &str, end_date: &str, reason: Option<&str>) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "start_date": start_date,
            "end_date": end_date,
            "reason": reason
        })
    }

    pub fn appointment_response(
        doctor_id: &str,
        patient_id: &str,
        date: &str,
        start: &str,
        end: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "date": date,
            "start_time": start,
            "end_time": end,
            "status": status,
            "is_teleconsultation": false,
            "reason": "routine checkup",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        })
    }
}
