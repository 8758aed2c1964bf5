// [libs/infra/adapters/src/email.rs]
//! Transactional email adapter: one send per notification, returning
//! the provider's message id for audit correlation. Fallback for this
//! adapter is log-only (see the resilience fabric), never a retry loop
//! against the user's inbox.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::AdapterError;

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[async_trait]
pub trait EmailAdapter: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<String, AdapterError>;
}

pub struct HttpEmailAdapter {
    client: Client,
    base_url: String,
    from_address: String,
}

impl HttpEmailAdapter {
    pub fn new(base_url: impl Into<String>, api_key: &str, from_address: impl Into<String>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .expect("api key must be a valid header value");
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent("grantwell-notification-dispatcher/1.0")
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("email adapter http client must build");

        HttpEmailAdapter { client, base_url: base_url.into().trim_end_matches('/').to_string(), from_address: from_address.into() }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

#[async_trait]
impl EmailAdapter for HttpEmailAdapter {
    async fn send(&self, message: &EmailMessage) -> Result<String, AdapterError> {
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .json(&SendRequest {
                from: &self.from_address,
                to: &message.to,
                subject: &message.subject,
                html: &message.html_body,
                text: &message.text_body,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => {
                let parsed: SendResponse = response.json().await.map_err(|e| AdapterError::Decoding(e.to_string()))?;
                Ok(parsed.id)
            }
            StatusCode::UNAUTHORIZED => Err(AdapterError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(AdapterError::RateLimited { retry_after_secs: 60 }),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AdapterError::ServerRejection { status: status.as_u16(), body })
            }
        }
    }
}

/// Fallback used when the email breaker is open: logs the message
/// that would have been sent and returns a synthetic id, matching the
/// "email → log-only" fallback policy.
pub struct LoggingEmailFallback;

#[async_trait]
impl EmailAdapter for LoggingEmailFallback {
    async fn send(&self, message: &EmailMessage) -> Result<String, AdapterError> {
        tracing::warn!(to = %message.to, subject = %message.subject, "email breaker open, logging instead of sending");
        Ok(format!("log-only-{}", uuid::Uuid::new_v4()))
    }
}
