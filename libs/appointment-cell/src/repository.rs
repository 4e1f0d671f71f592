// libs/appointment-cell/src/repository.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use shared_database::{StoreClient, StoreError};

use crate::models::{Appointment, AppointmentStatus, AppointmentWithUser};

/// Data-access failures, decoupled from business rules. `DuplicateSlot` is
/// the translated uniqueness-constraint violation.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("slot already exists")]
    DuplicateSlot,

    #[error("appointment not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => {
                debug!("Store uniqueness constraint violated: {}", msg);
                RepositoryError::DuplicateSlot
            }
            StoreError::Unavailable(msg) => RepositoryError::StoreUnavailable(msg),
            other => RepositoryError::Store(other.to_string()),
        }
    }
}

/// Query/command layer over the `appointments` collection. No business
/// validation here; every operation is a single store round-trip.
pub struct AppointmentRepository {
    store: Arc<StoreClient>,
}

const USER_EMBED: &str = "select=*,user:users(first_name,last_name,email,phone_number)";

impl AppointmentRepository {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Insert a new `scheduled` appointment. The store's unique indexes are
    /// the authoritative backstop against concurrent inserts for the same
    /// slot; a violation surfaces as `DuplicateSlot`.
    pub async fn create(
        &self,
        user_id: Uuid,
        date: &str,
        time: &str,
    ) -> Result<Appointment, RepositoryError> {
        let now = Utc::now();
        let body = json!({
            "user_id": user_id,
            "date": date,
            "time": time,
            "status": AppointmentStatus::Scheduled.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let rows: Vec<Appointment> = self.store.insert("/rest/v1/appointments", body).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Store("insert returned no rows".to_string()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, RepositoryError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", id);
        let rows: Vec<Appointment> = self.store.select(&path).await?;
        Ok(rows.into_iter().next())
    }

    /// The caller's-own-duplicate pre-check.
    pub async fn find_by_user_date_time(
        &self,
        user_id: Uuid,
        date: &str,
        time: &str,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&date=eq.{}&time=eq.{}&limit=1",
            user_id, date, time
        );
        let rows: Vec<Appointment> = self.store.select(&path).await?;
        Ok(rows.into_iter().next())
    }

    /// All appointments for a calendar day, optionally narrowed to an exact
    /// time for conflict checks. Embeds the owner's display fields for the
    /// admin view.
    pub async fn find_by_date(
        &self,
        date: &str,
        time_filter: Option<&str>,
    ) -> Result<Vec<AppointmentWithUser>, RepositoryError> {
        let mut path = format!("/rest/v1/appointments?date=eq.{}&{}", date, USER_EMBED);
        if let Some(time) = time_filter {
            path.push_str(&format!("&time=eq.{}", time));
        }
        path.push_str("&order=time.asc");

        let rows: Vec<AppointmentWithUser> = self.store.select(&path).await?;
        Ok(rows)
    }

    pub async fn find_all_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&order=date.asc,time.asc",
            user_id
        );
        let rows: Vec<Appointment> = self.store.select(&path).await?;
        Ok(rows)
    }

    /// Partial update of the status column; the store re-validates the enum
    /// as a second line of defense.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, RepositoryError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let body = json!({
            "status": status.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let rows: Vec<Appointment> = self.store.update(&path, body).await?;

        rows.into_iter().next().ok_or(RepositoryError::NotFound)
    }

    /// Administrative delete path; not reachable through the booking routes.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        self.store.delete(&path).await?;
        Ok(())
    }
}
