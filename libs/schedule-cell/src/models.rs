use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StorageError;
use shared_models::AppError;

/// One weekday's entry in a doctor's recurring template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    pub day: Weekday,
    pub is_working: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// A doctor's recurring weekly template: seven `DayHours` entries (one
/// per weekday) plus the slot grid granularity. All times are
/// clinic-local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub doctor_id: Uuid,
    pub slot_duration_minutes: i32,
    pub working_days: Vec<DayHours>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklySchedule {
    pub fn day(&self, day: Weekday) -> Option<&DayHours> {
        self.working_days.iter().find(|d| d.day == day)
    }
}

/// Recurring weekly exclusion window (e.g. lunch). Not date-specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Break {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
}

/// Inclusive whole-day date range during which a doctor takes no
/// appointments, independent of weekday recurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vacation {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl Vacation {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Aggregate returned by `ScheduleStore::get_schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub template: WeeklySchedule,
    pub breaks: Vec<Break>,
    pub vacations: Vec<Vacation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertScheduleRequest {
    pub slot_duration_minutes: i32,
    pub working_days: Vec<DayHours>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBreakRequest {
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVacationRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Bookable slots for one `(doctor, date)` pair. `available` reflects
/// the weekly template and vacations; a working day whose slots have
/// all elapsed or been booked is still `available: true` with an empty
/// slot list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub available: bool,
    pub reason: Option<String>,
    pub slots: Vec<AvailableSlot>,
}

/// Projection of an appointment row: availability only needs the start
/// times that are occupied.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedStart {
    pub start_time: NaiveTime,
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No schedule configured for doctor {0}")]
    ScheduleNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(msg) => AppError::Validation(msg),
            ScheduleError::ScheduleNotFound(id) => {
                AppError::NotFound(format!("No schedule configured for doctor {}", id))
            }
            ScheduleError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}
