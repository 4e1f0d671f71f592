use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Errors surfaced by the store client. `Conflict` is the uniqueness-constraint
/// signal the booking service relies on to resolve the read-check/write race.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store constraint violation: {0}")]
    Conflict(String),

    #[error("store resource not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode store response: {0}")]
    Decode(String),
}

/// HTTP client for the Supabase/PostgREST document store. Built once at
/// startup and shared process-wide; the inner reqwest client owns the
/// connection pool (bounded connect timeout, no cooperative cancellation).
pub struct StoreClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl StoreClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn headers(&self, representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.anon_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if representation {
            // PostgREST returns the affected rows only when asked
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        headers
    }

    async fn send<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        representation: bool,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request: {} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(representation));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => StoreError::Conflict(error_text),
                StatusCode::NOT_FOUND => StoreError::NotFound(error_text),
                _ => StoreError::Api {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// GET a filtered collection, e.g. `/rest/v1/appointments?date=eq.2025-06-10`.
    pub async fn select<T>(&self, path: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.send(Method::GET, path, None, false).await
    }

    /// POST a new row, returning the stored representation. A violated unique
    /// index comes back as `StoreError::Conflict`.
    pub async fn insert<T>(&self, path: &str, body: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body), true).await
    }

    /// PATCH matching rows, returning updated representations. The store
    /// re-validates column constraints here as a second line of defense.
    pub async fn update<T>(&self, path: &str, body: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, Some(body), true).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.send::<Vec<Value>>(Method::DELETE, path, None, true)
            .await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
