use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::events::{AppointmentEvent, EventSink, LogEventSink};
use crate::services::store::AppointmentStore;

/// Grace period after the scheduled start before a confirmed
/// appointment qualifies as a no-show.
const NO_SHOW_THRESHOLD_MINUTES: i64 = 30;

/// State machine over appointment statuses. Transitions are
/// single-step; a pending appointment cannot jump straight to
/// completed or no-show without passing through confirmed.
pub struct AppointmentLifecycleService {
    store: AppointmentStore,
    events: Arc<dyn EventSink>,
}

impl AppointmentLifecycleService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            store: AppointmentStore::with_client(supabase),
            events: Arc::new(LogEventSink),
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The statuses an appointment may move to from `current`.
    pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current {
            AppointmentStatus::Pending => {
                &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            // Terminal states
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => &[],
        }
    }

    pub fn validate_transition(
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", from, to);

        if !Self::valid_transitions(from).contains(&to) {
            warn!("Invalid status transition attempted: {} -> {}", from, to);
            return Err(AppointmentError::InvalidTransition { from, to });
        }

        Ok(())
    }

    /// Apply a status transition and emit the change event. The row is
    /// left untouched when the transition is illegal.
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.store.get_appointment(appointment_id, auth_token).await?;

        Self::validate_transition(current.status, new_status)?;

        let updated = self
            .store
            .update_status(appointment_id, new_status, auth_token)
            .await?;

        self.events
            .publish(AppointmentEvent::StatusChanged {
                appointment_id,
                old: current.status,
                new: updated.status,
            })
            .await;

        Ok(updated)
    }

    /// Predicate for the external time-based trigger: a confirmed
    /// appointment whose start has been missed by more than the grace
    /// period should be marked no-show. The core itself runs no
    /// background scheduler.
    pub fn should_mark_no_show(appointment: &Appointment, now: NaiveDateTime) -> bool {
        if appointment.status != AppointmentStatus::Confirmed {
            return false;
        }

        let threshold = appointment.date.and_time(appointment.start_time)
            + Duration::minutes(NO_SHOW_THRESHOLD_MINUTES);
        now > threshold
    }
}
