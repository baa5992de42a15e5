//! HTTP client for the prediction backend
//!
//! Uploads recorded clips as multipart form data and exposes the auxiliary
//! endpoints (dish info, health). Timeouts are enforced client-side per
//! request; a timed-out request is aborted, not left dangling.

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Documented default when no override or environment setting is present
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Full base-URL override, e.g. `http://10.0.0.5:9000`
pub const BACKEND_URL_ENV: &str = "ACCENT_BACKEND_URL";

/// Named service host (docker-compose style); expands to `http://{host}:8000`
pub const BACKEND_HOST_ENV: &str = "ACCENT_BACKEND_HOST";

const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);
const PREPROCESS_TIMEOUT: Duration = Duration::from_secs(20);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend communication errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Backend did not respond within {0}s")]
    TimeoutExceeded(u64),
    #[error("Backend error: {status} - {body}")]
    Backend { status: u16, body: String },
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub struct PredictionClient {
    base_url: String,
    client: reqwest::Client,
    analysis_timeout: Duration,
    preprocess_timeout: Duration,
}

impl PredictionClient {
    /// Build a client with the base URL resolved once, at construction
    pub fn new(override_url: Option<&str>) -> Self {
        let base_url = resolve_base_url(
            override_url,
            std::env::var(BACKEND_URL_ENV).ok().as_deref(),
            std::env::var(BACKEND_HOST_ENV).ok().as_deref(),
        );
        log::debug!("prediction backend: {}", base_url);
        Self {
            base_url,
            client: reqwest::Client::new(),
            analysis_timeout: ANALYSIS_TIMEOUT,
            preprocess_timeout: PREPROCESS_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeouts(mut self, analysis: Duration, preprocess: Duration) -> Self {
        self.analysis_timeout = analysis;
        self.preprocess_timeout = preprocess;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a clip for accent analysis. 30s timeout.
    pub async fn submit_for_analysis(&self, wav_bytes: Vec<u8>) -> Result<Value, ApiError> {
        let endpoint = format!("{}/predict/", self.base_url);
        self.submit(wav_bytes, &endpoint, self.analysis_timeout).await
    }

    /// Upload a clip for preprocessing. 20s timeout.
    ///
    /// Best-effort: callers log failures and continue to analysis.
    pub async fn submit_for_preprocess(&self, wav_bytes: Vec<u8>) -> Result<Value, ApiError> {
        let endpoint = format!("{}/preprocess/", self.base_url);
        self.submit(wav_bytes, &endpoint, self.preprocess_timeout).await
    }

    async fn submit(
        &self,
        wav_bytes: Vec<u8>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Value, ApiError> {
        log::debug!(
            "uploading {:.2}KB to {}",
            wav_bytes.len() as f64 / 1024.0,
            endpoint
        );

        let part = Part::bytes(wav_bytes)
            .file_name("recording.wav")
            .mime_str("audio/wav")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_timeout(e, timeout))?;

        Self::json_or_backend_error(response).await
    }

    /// Fetch dish information for a display region. 404 surfaces as a
    /// Backend error; callers fall back to the bundled database.
    pub async fn dish_info(&self, region: &str) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(format!("{}/dish-info", self.base_url))
            .query(&[("region", region)])
            .timeout(ANALYSIS_TIMEOUT)
            .send()
            .await
            .map_err(|e| map_timeout(e, ANALYSIS_TIMEOUT))?;

        Self::json_or_backend_error(response).await
    }

    /// Probe the backend health endpoint
    pub async fn health(&self) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| map_timeout(e, HEALTH_TIMEOUT))?;

        Self::json_or_backend_error(response).await
    }

    async fn json_or_backend_error(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

fn map_timeout(error: reqwest::Error, timeout: Duration) -> ApiError {
    if error.is_timeout() {
        ApiError::TimeoutExceeded(timeout.as_secs())
    } else {
        ApiError::Request(error)
    }
}

/// Resolve the backend base URL: explicit override, then environment
/// settings, then the documented default. Never fails.
pub fn resolve_base_url(
    override_url: Option<&str>,
    env_url: Option<&str>,
    env_host: Option<&str>,
) -> String {
    if let Some(url) = override_url
        && !url.is_empty()
    {
        return url.trim_end_matches('/').to_string();
    }
    if let Some(url) = env_url
        && !url.is_empty()
    {
        return url.trim_end_matches('/').to_string();
    }
    if let Some(host) = env_host
        && !host.is_empty()
    {
        return format!("http://{}:8000", host);
    }
    DEFAULT_BACKEND_URL.to_string()
}
