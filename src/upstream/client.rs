use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Timeout for search requests
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for health probes; shorter so /health stays responsive
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Query used by the health probe
const PROBE_QUERY: &str = "apple";

/// Failure talking to FoodData Central
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport-level failure: DNS, connect, TLS or timeout
    #[error("Unable to reach the nutrition database")]
    Network(#[source] reqwest::Error),
    /// Upstream answered with a non-success status
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        body: Option<Value>,
    },
    /// Upstream answered 200 but the body was not a JSON object
    #[error("Nutrition database returned an unparseable response")]
    InvalidBody,
}

/// Upstream reachability as reported by /health?probe=true
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStatus {
    Healthy,
    Unhealthy,
    Unreachable,
    NotConfigured,
}

/// Client for the FoodData Central search endpoint.
///
/// Holds the API key, so it has no Debug impl and must never be logged.
#[derive(Clone)]
pub struct FoodDataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FoodDataClient {
    pub fn new(api_key: String, base_url: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Search foods by name. Returns the parsed response body, which is
    /// guaranteed to be a JSON object.
    pub async fn search_foods(&self, query: &str, page_size: u32) -> Result<Value, UpstreamError> {
        let url = format!("{}/foods/search", self.base_url);
        debug!(%query, page_size, "Calling FoodData Central");

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .query(&[("pageSize", page_size)])
            .send()
            .await
            .map_err(UpstreamError::Network)?;

        let status = response.status();
        if !status.is_success() {
            // Keep the upstream body when it parses; callers echo it back
            let body = response.json::<Value>().await.ok();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: status_message(status.as_u16()).to_string(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| UpstreamError::InvalidBody)?;
        if !body.is_object() {
            return Err(UpstreamError::InvalidBody);
        }
        Ok(body)
    }

    /// Bounded reachability probe. Never fails: every outcome collapses
    /// into an UpstreamStatus so /health itself stays healthy.
    pub async fn probe(&self) -> UpstreamStatus {
        let url = format!("{}/foods/search", self.base_url);
        let result = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", PROBE_QUERY)])
            .query(&[("pageSize", 1u32)])
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => UpstreamStatus::Healthy,
            Ok(response) => {
                debug!(status = %response.status(), "Upstream probe returned non-success");
                UpstreamStatus::Unhealthy
            }
            Err(err) => {
                debug!(error = %err.without_url(), "Upstream probe failed");
                UpstreamStatus::Unreachable
            }
        }
    }
}

/// Fixed status→message table for upstream responses
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid request sent to nutrition database",
        401 => "Invalid API key for nutrition database",
        403 => "Access to nutrition database forbidden",
        404 => "Nutrition database endpoint not found",
        429 => "Nutrition database rate limit exceeded",
        500 => "Nutrition database internal error",
        502 => "Nutrition database gateway error",
        503 => "Nutrition database temporarily unavailable",
        504 => "Nutrition database request timed out",
        _ => "Unexpected response from nutrition database",
    }
}
