use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, NaiveTime, Timelike};
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    AvailableSlot, BookedStart, Break, DayAvailability, DayHours, ScheduleError,
};
use crate::services::store::ScheduleStore;

/// Computes the ordered list of bookable slot start times for a
/// `(doctor, date)` pair by combining the weekly template, breaks and
/// vacations with the appointments already booked for that date.
///
/// Reads only; bookings are committed by the appointment cell, which
/// re-invokes this service to validate a request freshly.
pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
    store: ScheduleStore,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            store: ScheduleStore::with_client(Arc::clone(&supabase)),
            supabase,
        }
    }

    pub async fn get_day_availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<DayAvailability, ScheduleError> {
        debug!("Calculating availability for doctor {} on {}", doctor_id, date);

        let schedule = self.store.get_schedule(doctor_id, auth_token).await?;

        let weekday = date.weekday();
        let day = match schedule.template.day(weekday) {
            Some(day) if day.is_working => day,
            _ => {
                return Ok(DayAvailability {
                    doctor_id,
                    date,
                    available: false,
                    reason: None,
                    slots: Vec::new(),
                });
            }
        };

        if let Some(vacation) = schedule.vacations.iter().find(|v| v.covers(date)) {
            debug!("Doctor {} is on vacation on {}", doctor_id, date);
            return Ok(DayAvailability {
                doctor_id,
                date,
                available: false,
                reason: vacation
                    .reason
                    .clone()
                    .or_else(|| Some("On vacation".to_string())),
                slots: Vec::new(),
            });
        }

        let now = Local::now();
        let today = now.date_naive();

        // Every slot of a fully elapsed date has passed; skip the grid.
        if date < today {
            return Ok(DayAvailability {
                doctor_id,
                date,
                available: true,
                reason: None,
                slots: Vec::new(),
            });
        }

        let booked = self.booked_start_times(doctor_id, date, auth_token).await?;
        let not_before = (date == today).then(|| now.time());

        let slots = build_day_slots(
            day,
            schedule.template.slot_duration_minutes,
            &schedule.breaks,
            &booked,
            not_before,
        );

        debug!("Found {} available slots", slots.len());
        Ok(DayAvailability {
            doctor_id,
            date,
            available: true,
            reason: None,
            slots,
        })
    }

    /// Start times occupied by active appointments for that doctor/date.
    /// Cancelled and no-show rows are filtered out server-side, so their
    /// slots show up as free again.
    async fn booked_start_times(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<NaiveTime>, ScheduleError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&status=in.(pending,confirmed,completed)&select=start_time&order=start_time.asc",
            doctor_id, date
        );

        let rows: Vec<BookedStart> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(rows.into_iter().map(|row| row.start_time).collect())
    }
}

/// Generate the candidate slot grid for one working day and strip out
/// slots excluded by breaks, existing bookings, or the clock.
///
/// The grid starts at the day's opening time and steps by the slot
/// duration; a candidate is only emitted if it fits entirely before
/// closing time, so an uneven trailing period is dropped rather than
/// rounded. Break exclusion is a strict half-open overlap test: a slot
/// ending exactly when a break starts (or starting exactly when it
/// ends) stays available.
///
/// Arithmetic runs on seconds-from-midnight; `NaiveTime + Duration`
/// wraps at midnight, which would make a grid loop on a late-closing
/// day never terminate.
pub fn build_day_slots(
    day: &DayHours,
    slot_duration_minutes: i32,
    breaks: &[Break],
    booked: &[NaiveTime],
    not_before: Option<NaiveTime>,
) -> Vec<AvailableSlot> {
    if slot_duration_minutes <= 0 {
        return Vec::new();
    }

    let step = slot_duration_minutes as u32 * 60;
    let opening = day.start_time.num_seconds_from_midnight();
    let closing = day.end_time.num_seconds_from_midnight();

    let mut slots = Vec::new();
    let mut cursor = opening;

    while cursor + step <= closing {
        let (Some(start), Some(end)) = (
            NaiveTime::from_num_seconds_from_midnight_opt(cursor, 0),
            NaiveTime::from_num_seconds_from_midnight_opt(cursor + step, 0),
        ) else {
            break;
        };
        cursor += step;

        let in_break = breaks
            .iter()
            .any(|b| b.day == day.day && start < b.end_time && end > b.start_time);
        if in_break {
            continue;
        }

        if booked.contains(&start) {
            continue;
        }

        if not_before.is_some_and(|now| start < now) {
            continue;
        }

        slots.push(AvailableSlot {
            start_time: start,
            end_time: end,
        });
    }

    slots
}
