// libs/auth-cell/src/repository.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use shared_database::{StoreClient, StoreError};

use crate::models::UserRecord;

/// Query/command layer over the `users` collection.
pub struct UserRepository {
    store: Arc<StoreClient>,
}

impl UserRepository {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Insert a new account. The store's unique indexes on email and phone
    /// number surface as `StoreError::Conflict`.
    pub async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let now = Utc::now();
        let body = json!({
            "first_name": first_name,
            "last_name": last_name,
            "phone_number": phone_number,
            "email": email.to_lowercase(),
            "password_hash": password_hash,
            "is_verified": false,
            "is_admin": false,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let rows: Vec<UserRecord> = self.store.insert("/rest/v1/users", body).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let path = format!(
            "/rest/v1/users?email=eq.{}&limit=1",
            email.to_lowercase()
        );
        let rows: Vec<UserRecord> = self.store.select(&path).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let path = format!("/rest/v1/users?id=eq.{}&limit=1", id);
        let rows: Vec<UserRecord> = self.store.select(&path).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn set_verified(&self, id: Uuid) -> Result<UserRecord, StoreError> {
        self.update(id, json!({ "is_verified": true })).await
    }

    pub async fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        self.update(id, json!({ "password_hash": password_hash })).await
    }

    async fn update(&self, id: Uuid, mut body: serde_json::Value) -> Result<UserRecord, StoreError> {
        if let Some(fields) = body.as_object_mut() {
            fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let path = format!("/rest/v1/users?id=eq.{}", id);
        let rows: Vec<UserRecord> = self.store.update(&path, body).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound("user update matched no rows".to_string()))
    }
}
