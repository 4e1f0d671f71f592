// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Months, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::StoreClient;

use crate::models::{
    Appointment, AppointmentStatus, BookingError, BookingPolicy, DayListing, SlotView,
};
use crate::repository::{AppointmentRepository, RepositoryError};

/// Validates and enacts slot creation, listing and status transitions. Holds
/// no in-process shared mutable state; all coordination is delegated to the
/// store's constraints.
pub struct BookingService {
    repository: AppointmentRepository,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self {
            repository: AppointmentRepository::new(store),
            policy: BookingPolicy::default(),
        }
    }

    /// Book a slot for `user_id`. Checks run cheapest-first and short-circuit
    /// on the first failure; the store's uniqueness constraint backs the
    /// read-then-write checks against concurrent requests.
    pub async fn create_appointment(
        &self,
        user_id: Uuid,
        date: &str,
        time: &str,
    ) -> Result<Appointment, BookingError> {
        debug!("Booking request: user={} date={} time={}", user_id, date, time);

        // 1. Calendar policy: business hours on the half-hour grid
        self.check_calendar_policy(time)?;

        // 2. The caller must not already hold this exact slot
        let existing = self
            .repository
            .find_by_user_date_time(user_id, date, time)
            .await
            .map_err(store_err)?;
        if existing.is_some() {
            return Err(BookingError::DuplicateBooking);
        }

        // 3. No other appointment may occupy the slot, regardless of status
        let conflicting = self
            .repository
            .find_by_date(date, Some(time))
            .await
            .map_err(store_err)?;
        if !conflicting.is_empty() {
            return Err(BookingError::SlotTaken);
        }

        // 4. Strictly in the future
        let slot = self.parse_slot_datetime(date, time)?;
        let now = Utc::now().naive_utc();
        if slot <= now {
            return Err(BookingError::PastDate);
        }

        // 5. Within the booking horizon
        let horizon = Utc::now()
            .checked_add_months(Months::new(self.policy.horizon_months))
            .ok_or_else(|| BookingError::Store("horizon computation overflow".to_string()))?
            .naive_utc();
        if slot > horizon {
            return Err(BookingError::BeyondBookingHorizon);
        }

        // 6. Persist. Two requests can both pass checks 2-3 for an empty
        // slot; the store's unique index lets exactly one insert through, and
        // the loser must see a conflict rather than a generic server error.
        let appointment = match self.repository.create(user_id, date, time).await {
            Ok(appointment) => appointment,
            Err(RepositoryError::DuplicateSlot) => {
                warn!(
                    "Lost slot race: user={} date={} time={}",
                    user_id, date, time
                );
                return Err(BookingError::SlotTaken);
            }
            Err(e) => return Err(store_err(e)),
        };

        info!(
            "Appointment {} booked for user {} at {} {}",
            appointment.id, user_id, date, time
        );
        Ok(appointment)
    }

    /// All appointments owned by the caller, any status.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Appointment>, BookingError> {
        let appointments = self
            .repository
            .find_all_for_user(user_id)
            .await
            .map_err(store_err)?;

        if appointments.is_empty() {
            return Err(BookingError::NoAppointmentsFound);
        }
        Ok(appointments)
    }

    /// Day listing, shaped by role: admins get full records with owner
    /// contact fields; everyone else gets the taken times of still-scheduled
    /// slots and nothing more.
    pub async fn list_by_date(
        &self,
        date: &str,
        is_admin: bool,
    ) -> Result<DayListing, BookingError> {
        let appointments = self
            .repository
            .find_by_date(date, None)
            .await
            .map_err(store_err)?;

        if appointments.is_empty() {
            return Err(BookingError::NoAppointmentsFound);
        }

        if !is_admin {
            let slots = appointments
                .into_iter()
                .filter(|a| a.appointment.status == AppointmentStatus::Scheduled)
                .map(|a| SlotView {
                    time: a.appointment.time,
                })
                .collect();
            return Ok(DayListing::Slots(slots));
        }

        Ok(DayListing::Full(appointments))
    }

    /// Status transition, authorization-gated. Admins may set any valid
    /// status on any appointment; regular users may only cancel their own
    /// still-scheduled ones.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        let appointment = self
            .repository
            .find_by_id(appointment_id)
            .await
            .map_err(store_err)?
            .ok_or(BookingError::NotFound)?;

        if !is_admin {
            if appointment.user_id != user_id {
                return Err(BookingError::Forbidden);
            }
            if appointment.status != AppointmentStatus::Scheduled {
                return Err(BookingError::InvalidStateTransition);
            }
            if new_status != AppointmentStatus::Canceled {
                return Err(BookingError::Forbidden);
            }
        }

        let updated = match self.repository.update_status(appointment_id, new_status).await {
            Ok(updated) => updated,
            Err(RepositoryError::NotFound) => return Err(BookingError::NotFound),
            Err(e) => return Err(store_err(e)),
        };

        info!(
            "Appointment {} transitioned {} -> {}",
            appointment_id, appointment.status, new_status
        );
        Ok(updated)
    }

    /// Slots must fall in [09:00, 16:30] on :00/:30 boundaries.
    fn check_calendar_policy(&self, time: &str) -> Result<(), BookingError> {
        let (hours, minutes) = parse_time(time)?;

        if hours < self.policy.first_hour || hours > self.policy.last_hour {
            return Err(BookingError::InvalidSlotTime(
                "The selected time is outside the 09:00 to 16:30 booking window".to_string(),
            ));
        }
        if minutes % self.policy.interval_minutes != 0 {
            return Err(BookingError::InvalidSlotTime(
                "The selected time is not valid; only 30-minute intervals are allowed".to_string(),
            ));
        }
        Ok(())
    }

    fn parse_slot_datetime(&self, date: &str, time: &str) -> Result<NaiveDateTime, BookingError> {
        let (hours, minutes) = parse_time(time)?;
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            BookingError::InvalidSlotTime("Invalid calendar date".to_string())
        })?;

        day.and_hms_opt(hours, minutes, 0)
            .ok_or_else(|| BookingError::InvalidSlotTime("Invalid time of day".to_string()))
    }
}

/// Re-derive numeric hour/minute without assuming upstream validation ran.
fn parse_time(time: &str) -> Result<(u32, u32), BookingError> {
    let invalid = || BookingError::InvalidSlotTime("Invalid time format (expected HH:MM)".to_string());

    let (h, m) = time.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = h.parse().map_err(|_| invalid())?;
    let minutes: u32 = m.parse().map_err(|_| invalid())?;

    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok((hours, minutes))
}

fn store_err(err: RepositoryError) -> BookingError {
    BookingError::Store(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> BookingService {
        let config = shared_config::AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test".to_string(),
            jwt_secret: "test".to_string(),
            frontend_url: String::new(),
            email_api_url: String::new(),
            email_api_key: String::new(),
            email_from: String::new(),
        };
        BookingService::new(Arc::new(StoreClient::new(&config)))
    }

    #[test]
    fn accepts_grid_times_within_window() {
        let svc = service();
        for time in ["09:00", "09:30", "12:00", "16:00", "16:30"] {
            assert!(svc.check_calendar_policy(time).is_ok(), "rejected {}", time);
        }
    }

    #[test]
    fn rejects_times_outside_window() {
        let svc = service();
        for time in ["08:30", "08:59", "17:00", "00:00", "23:30"] {
            assert_matches!(
                svc.check_calendar_policy(time),
                Err(BookingError::InvalidSlotTime(_)),
                "accepted {}",
                time
            );
        }
    }

    #[test]
    fn rejects_off_grid_minutes() {
        let svc = service();
        for time in ["09:15", "10:01", "16:29", "12:45"] {
            assert_matches!(
                svc.check_calendar_policy(time),
                Err(BookingError::InvalidSlotTime(_)),
                "accepted {}",
                time
            );
        }
    }

    #[test]
    fn rejects_garbage_time_strings() {
        let svc = service();
        for time in ["930", "nine", "25:00", "09:99", ""] {
            assert_matches!(
                svc.check_calendar_policy(time),
                Err(BookingError::InvalidSlotTime(_))
            );
        }
    }

    #[test]
    fn parses_slot_datetime() {
        let svc = service();
        let slot = svc.parse_slot_datetime("2025-06-10", "10:00").unwrap();
        assert_eq!(slot.to_string(), "2025-06-10 10:00:00");

        assert_matches!(
            svc.parse_slot_datetime("2025-13-01", "10:00"),
            Err(BookingError::InvalidSlotTime(_))
        );
    }
}
