use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use schedule_cell::models::ScheduleError;
use shared_config::AppConfig;
use shared_database::StorageError;
use shared_models::AppError;

/// A booked consultation slot. Identity for double-booking purposes is
/// `(doctor_id, date, start_time)`; at most one row in an occupying
/// status may exist per key. Rows are never deleted -- every change of
/// mind is a status transition, so the audit trail survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub is_teleconsultation: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether an appointment in this status blocks its slot. Cancelled
    /// and no-show rows free the slot for rebooking.
    pub fn occupies_slot(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed | AppointmentStatus::Completed
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub reason: Option<String>,
    #[serde(default)]
    pub is_teleconsultation: bool,
}

/// Insert payload assembled by the booking coordinator once a request
/// has passed the fresh availability check.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub is_teleconsultation: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Deployment policy knobs for the booking coordinator. Whether a fresh
/// booking needs doctor confirmation is configuration, not something
/// the core derives.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub initial_status: AppointmentStatus,
}

impl BookingPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            initial_status: if config.booking_auto_confirm {
                AppointmentStatus::Confirmed
            } else {
                AppointmentStatus::Pending
            },
        }
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            initial_status: AppointmentStatus::Pending,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Requested slot is not available")]
    SlotUnavailable,

    /// Storage-layer race on insert. Translated to `SlotUnavailable`
    /// before it reaches a caller.
    #[error("Slot already booked")]
    Conflict,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for AppointmentError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(_) => AppointmentError::Conflict,
            other => AppointmentError::Storage(other),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::SlotUnavailable | AppointmentError::Conflict => AppError::SlotUnavailable(
                "Requested slot is not available; please pick another time".to_string(),
            ),
            AppointmentError::InvalidTransition { from, to } => {
                AppError::InvalidTransition(format!("Cannot move appointment from {} to {}", from, to))
            }
            AppointmentError::Validation(msg) => AppError::Validation(msg),
            AppointmentError::Schedule(e) => e.into(),
            AppointmentError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}
