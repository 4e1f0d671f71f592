// libs/auth-cell/src/services/mailer.rs
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

/// Fire-and-forget email delivery through an HTTP email API. Failures are
/// logged and never propagate to the calling request.
#[derive(Clone)]
pub struct Mailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl Mailer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        }
    }

    /// Dispatch on a detached task; the caller's request never waits on the
    /// email provider.
    pub fn send(&self, to: &str, subject: &str, html: &str) {
        if self.api_url.is_empty() {
            warn!("Email delivery disabled, dropping message to {}", to);
            return;
        }

        let mailer = self.clone();
        let to = to.to_string();
        let subject = subject.to_string();
        let html = html.to_string();

        tokio::spawn(async move {
            let body = json!({
                "from": mailer.from,
                "to": to,
                "subject": subject,
                "html": html,
            });

            let result = mailer
                .client
                .post(&mailer.api_url)
                .bearer_auth(&mailer.api_key)
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    debug!("Email sent to {}", to);
                }
                Ok(response) => {
                    error!("Email provider rejected message to {}: {}", to, response.status());
                }
                Err(e) => {
                    error!("Error sending email to {}: {}", to, e);
                }
            }
        });
    }
}
