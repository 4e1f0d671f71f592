// libs/appointment-cell/src/models.rs
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A booked half-hour slot. Date and time are stored as the literal strings
/// the wire carries (`YYYY-MM-DD`, `HH:MM`); the booking service re-derives
/// numeric hour/minute when it needs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "canceled" => Some(AppointmentStatus::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// Owner display fields embedded by the store on day queries, for the admin
/// view only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithUser {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub user: Option<UserContact>,
}

/// Non-admin projection of a day listing: callers may learn which slots are
/// taken but not by whom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    pub time: String,
}

/// Role-shaped result of a day listing.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DayListing {
    Full(Vec<AppointmentWithUser>),
    Slots(Vec<SlotView>),
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

static DATE_RE: OnceLock<Regex> = OnceLock::new();
static TIME_RE: OnceLock<Regex> = OnceLock::new();

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

fn time_re() -> &'static Regex {
    TIME_RE.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap())
}

pub fn validate_date_format(date: &str) -> Result<(), String> {
    if date_re().is_match(date) {
        Ok(())
    } else {
        Err("Invalid date format (expected YYYY-MM-DD)".to_string())
    }
}

pub fn validate_time_format(time: &str) -> Result<(), String> {
    if time_re().is_match(time) {
        Ok(())
    } else {
        Err("Invalid time format (expected HH:MM)".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub date: String,
    pub time: String,
}

impl CreateAppointmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_date_format(&self.date)?;
        validate_time_format(&self.time)
    }
}

/// Target status arrives as a raw string so that an out-of-enum value fails
/// through the normal error envelope instead of a body-rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

// ==============================================================================
// BOOKING POLICY & ERRORS
// ==============================================================================

/// Calendar policy for bookable slots.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub first_hour: u32,
    pub last_hour: u32,
    pub interval_minutes: u32,
    pub horizon_months: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            first_hour: 9,
            last_hour: 16,
            interval_minutes: 30,
            horizon_months: 6,
        }
    }
}

/// Business-rule failures raised by the booking service. HTTP-free; the
/// handler layer maps each kind to a status code.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    InvalidSlotTime(String),

    #[error("You already have an appointment booked at that date and time")]
    DuplicateBooking,

    #[error("That slot is already reserved by another user")]
    SlotTaken,

    #[error("Appointments cannot be booked for past dates")]
    PastDate,

    #[error("Requested slot is too far ahead; try a date within the next 6 months")]
    BeyondBookingHorizon,

    #[error("No appointments found")]
    NoAppointmentsFound,

    #[error("Appointment not found")]
    NotFound,

    #[error("You do not have permission to modify this appointment")]
    Forbidden,

    #[error("Only scheduled appointments can be modified")]
    InvalidStateTransition,

    #[error("Invalid appointment status")]
    InvalidStatus,

    #[error("Store error: {0}")]
    Store(String),
}
