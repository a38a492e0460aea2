//! API client for the feedback backend
//!
//! Handles all HTTP communication with the backend API.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;
use crate::feedback::FeedbackPayload;

/// Fallback when the configured base URL is blank.
const DEFAULT_API_URL: &str = "http://localhost:3333";
#[cfg(test)]
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Something that can deliver a feedback payload.
pub(crate) trait SubmissionClient {
    async fn post(&self, path: &str, payload: &FeedbackPayload) -> Result<(), ApiError>;
}

/// API client for the feedback backend
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from config, honoring `FEEDBACK_FORM_API_*` overrides
    pub fn from_config(config: &ApiConfig) -> Self {
        let base_url = std::env::var("FEEDBACK_FORM_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| config.base_url.clone());

        let timeout_seconds = std::env::var("FEEDBACK_FORM_API_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or_else(|| config.timeout_seconds.max(1));

        let verify_ssl =
            parse_bool_env("FEEDBACK_FORM_API_VERIFY_SSL").unwrap_or(config.verify_ssl);

        Self::with_settings(base_url, timeout_seconds, verify_ssl)
    }

    /// Create with custom base URL
    #[cfg(test)]
    pub fn with_url(base_url: String) -> Self {
        Self::with_settings(base_url, DEFAULT_TIMEOUT_SECONDS, true)
    }

    fn with_settings(base_url: String, timeout_seconds: u64, verify_ssl: bool) -> Self {
        let timeout = Duration::from_secs(timeout_seconds.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .unwrap_or_else(|_| Client::new());

        ApiClient {
            client,
            base_url: normalize_base_url(&base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body; any 2xx counts as success and the body is ignored.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, "POST");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(ApiError::Api {
            status: status.as_u16(),
            message: error_body,
        })
    }
}

impl SubmissionClient for ApiClient {
    async fn post(&self, path: &str, payload: &FeedbackPayload) -> Result<(), ApiError> {
        self.post_json(path, payload).await
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }
    trimmed.trim_end_matches('/').to_string()
}

fn parse_bool_env(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    parse_bool_value(&value)
}

fn parse_bool_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
