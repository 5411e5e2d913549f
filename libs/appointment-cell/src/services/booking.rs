use std::sync::Arc;

use tracing::{info, warn};

use schedule_cell::services::availability::AvailabilityService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, BookAppointmentRequest, BookingPolicy, NewAppointment,
};
use crate::services::events::{AppointmentEvent, EventSink, LogEventSink};
use crate::services::store::AppointmentStore;

/// Turns a slot selection into a durable appointment.
///
/// The flow is optimistic check, pessimistic commit: availability is
/// recomputed from scratch for every request (a slot list cached by the
/// client may be stale), and the final word belongs to the store's
/// atomic insert. Losing the race between check and insert is reported
/// as the slot being unavailable; the caller re-queries and the user
/// picks again. The coordinator never retries on its own.
pub struct BookingService {
    availability: AvailabilityService,
    store: AppointmentStore,
    events: Arc<dyn EventSink>,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            availability: AvailabilityService::with_client(Arc::clone(&supabase)),
            store: AppointmentStore::with_client(supabase),
            events: Arc::new(LogEventSink),
            policy: BookingPolicy::from_config(config),
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_policy(mut self, policy: BookingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking request: patient {} with doctor {} on {} at {}",
            request.patient_id, request.doctor_id, request.date, request.start_time
        );

        let day = self
            .availability
            .get_day_availability(request.doctor_id, request.date, auth_token)
            .await?;

        let Some(slot) = day
            .slots
            .iter()
            .find(|slot| slot.start_time == request.start_time)
        else {
            warn!(
                "Requested slot {} on {} is not bookable for doctor {}",
                request.start_time, request.date, request.doctor_id
            );
            return Err(AppointmentError::SlotUnavailable);
        };

        let new_appointment = NewAppointment {
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            date: request.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: self.policy.initial_status,
            is_teleconsultation: request.is_teleconsultation,
            reason: request.reason,
        };

        let appointment = match self.store.insert(&new_appointment, auth_token).await {
            Ok(appointment) => appointment,
            Err(AppointmentError::Conflict) => {
                // A competing booking won between the availability check
                // and the insert.
                warn!(
                    "Lost booking race for doctor {} on {} at {}",
                    request.doctor_id, request.date, request.start_time
                );
                return Err(AppointmentError::SlotUnavailable);
            }
            Err(other) => return Err(other),
        };

        self.events
            .publish(AppointmentEvent::Created {
                appointment: appointment.clone(),
            })
            .await;

        info!(
            "Appointment {} booked with doctor {} ({})",
            appointment.id, appointment.doctor_id, appointment.status
        );
        Ok(appointment)
    }
}
