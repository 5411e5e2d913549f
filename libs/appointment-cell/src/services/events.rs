use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus};

/// Lifecycle events emitted by the scheduling core. The notification
/// dispatcher (reminders, email, push) consumes these; the core does
/// not know or care how they are delivered.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppointmentEvent {
    Created {
        appointment: Appointment,
    },
    StatusChanged {
        appointment_id: Uuid,
        old: AppointmentStatus,
        new: AppointmentStatus,
    },
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: AppointmentEvent);
}

/// Default sink: structured log lines only. Deployments wire in a real
/// dispatcher via `with_event_sink`.
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn publish(&self, event: AppointmentEvent) {
        match &event {
            AppointmentEvent::Created { appointment } => {
                info!(
                    appointment_id = %appointment.id,
                    doctor_id = %appointment.doctor_id,
                    patient_id = %appointment.patient_id,
                    date = %appointment.date,
                    start_time = %appointment.start_time,
                    "appointment created"
                );
            }
            AppointmentEvent::StatusChanged {
                appointment_id,
                old,
                new,
            } => {
                info!(
                    appointment_id = %appointment_id,
                    old = %old,
                    new = %new,
                    "appointment status changed"
                );
            }
        }
    }
}
