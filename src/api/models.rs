use std::sync::Arc;

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::config::AppConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::nutrition::NormalizedFood;
use crate::upstream::{FoodDataClient, UpstreamError, UpstreamStatus};

/// Default result count when the limit parameter is omitted
pub const DEFAULT_LIMIT: u32 = 10;
/// Hard cap on requested results; larger values clamp down to this
pub const MAX_LIMIT: u32 = 50;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// None until FDC_API_KEY is configured
    pub upstream: Option<FoodDataClient>,
    pub rate_limiter: Arc<RateLimiter>,
}

/// Query parameters accepted by GET /foods.
///
/// Both fields are extracted as raw strings so malformed input flows
/// through our own validation instead of an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct FoodQuery {
    #[serde(rename = "type")]
    pub food_type: Option<String>,
    pub limit: Option<String>,
}

/// A food query that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedQuery {
    pub query: String,
    pub limit: u32,
}

impl FoodQuery {
    /// Validate the request.
    ///
    /// Syntactic problems (shape, charset, limit) are `ValidationError`;
    /// strings that are well-formed but cannot name a food (too short,
    /// all digits, reserved terms) are `FoodTypeError`.
    pub fn validate(&self, blacklist: &[String]) -> Result<ValidatedQuery, ApiError> {
        let raw = self.food_type.as_deref().ok_or_else(|| {
            ApiError::Validation("The `type` query parameter is required".to_string())
        })?;

        let query = raw.trim();
        if query.is_empty() {
            return Err(ApiError::Validation(
                "The `type` query parameter cannot be empty".to_string(),
            ));
        }
        if query.chars().count() > 100 {
            return Err(ApiError::Validation(
                "The `type` query parameter must be at most 100 characters".to_string(),
            ));
        }
        if !query
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_')
        {
            return Err(ApiError::Validation(
                "The `type` query parameter may only contain letters, digits, spaces, hyphens and underscores"
                    .to_string(),
            ));
        }

        if query.chars().count() < 2 {
            return Err(ApiError::FoodType(format!(
                "'{query}' is too short to be a food name"
            )));
        }
        if query.chars().all(|c| c.is_ascii_digit()) {
            return Err(ApiError::FoodType(format!(
                "'{query}' is not a food name: digits only"
            )));
        }
        if !query.chars().any(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ApiError::FoodType(format!(
                "'{query}' contains no word characters"
            )));
        }
        if blacklist.iter().any(|w| w.eq_ignore_ascii_case(query)) {
            return Err(ApiError::FoodType(format!(
                "'{query}' is a reserved term, not a food name"
            )));
        }

        let limit = match self.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => {
                let parsed: i64 = raw.trim().parse().map_err(|_| {
                    ApiError::Validation(
                        "The `limit` query parameter must be an integer".to_string(),
                    )
                })?;
                if parsed < 1 {
                    return Err(ApiError::Validation(
                        "The `limit` query parameter must be at least 1".to_string(),
                    ));
                }
                parsed.min(i64::from(MAX_LIMIT)) as u32
            }
        };

        Ok(ValidatedQuery {
            query: query.to_string(),
            limit,
        })
    }
}

/// Successful response from GET /foods
#[derive(Debug, Serialize)]
pub struct FoodsResponse {
    pub query: String,
    pub limit: u32,
    pub count: usize,
    pub foods: Vec<NormalizedFood>,
}

/// Query parameters accepted by GET /health
#[derive(Debug, Default, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub probe: bool,
}

/// Response from GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub timestamp: String,
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<UpstreamStatus>,
}

/// Application error type.
///
/// Every variant renders as `{ error, type, timestamp, ...context }` with
/// a stable `type` tag; nothing is retried automatically.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    FoodType(String),
    #[error("{0}")]
    Configuration(String),
    #[error("Unable to reach the nutrition database")]
    Network { detail: Option<String> },
    #[error("{0}")]
    Parsing(String),
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        body: Option<Value>,
    },
    #[error("Too many requests, please try again later")]
    RateLimited { retry_after_secs: u64 },
}

impl ApiError {
    /// Stable machine-readable tag for the response envelope
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::FoodType(_) => "FoodTypeError",
            Self::Configuration(_) => "ConfigurationError",
            Self::Network { .. } => "NetworkError",
            Self::Parsing(_) => "ParsingError",
            Self::Upstream { .. } => "UpstreamAPIError",
            Self::RateLimited { .. } => "RateLimitError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::FoodType(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Network { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Parsing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            // Upstream 5xx means the service behind us is down, not that
            // we broke: collapse to 503 instead of echoing it
            Self::Upstream { status, .. } if *status >= 500 => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            // without_url strips the request URL, which carries the API key
            UpstreamError::Network(source) => Self::Network {
                detail: Some(source.without_url().to_string()),
            },
            UpstreamError::Status {
                status,
                message,
                body,
            } => Self::Upstream {
                status,
                message,
                body,
            },
            UpstreamError::InvalidBody => {
                Self::Parsing("Nutrition database returned an unparseable response".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), kind = self.kind(), "{}", self);
        }

        let mut body = json!({
            "error": self.to_string(),
            "type": self.kind(),
            "timestamp": Utc::now().to_rfc3339(),
        });

        let retry_after = match self {
            Self::Network {
                detail: Some(detail),
            } => {
                body["detail"] = json!(detail);
                None
            }
            Self::Upstream {
                status: upstream_status,
                body: upstream_body,
                ..
            } => {
                body["upstream_status"] = json!(upstream_status);
                if let Some(upstream_body) = upstream_body {
                    body["upstream_body"] = upstream_body;
                }
                None
            }
            Self::RateLimited { retry_after_secs } => {
                body["retry_after_seconds"] = json!(retry_after_secs);
                Some(retry_after_secs)
            }
            _ => None,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blacklist() -> Vec<String> {
        ["test", "debug", "admin", "system"]
            .iter()
            .map(|w| (*w).to_string())
            .collect()
    }

    fn query(food_type: Option<&str>, limit: Option<&str>) -> FoodQuery {
        FoodQuery {
            food_type: food_type.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn valid_query_passes_with_default_limit() {
        let validated = query(Some("chicken breast"), None)
            .validate(&blacklist())
            .expect("should validate");
        assert_eq!(validated.query, "chicken breast");
        assert_eq!(validated.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn missing_type_is_validation_error() {
        let err = query(None, None).validate(&blacklist()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn illegal_characters_are_validation_errors() {
        for bad in ["sushi!", "rice;drop", "pörkölt", "a=b"] {
            let err = query(Some(bad), None).validate(&blacklist()).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{bad}");
        }
    }

    #[test]
    fn over_100_chars_is_validation_error() {
        let long = "a".repeat(101);
        let err = query(Some(&long), None).validate(&blacklist()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn digits_only_is_food_type_error() {
        let err = query(Some("123"), None).validate(&blacklist()).unwrap_err();
        assert!(matches!(err, ApiError::FoodType(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn single_char_is_food_type_error() {
        let err = query(Some("a"), None).validate(&blacklist()).unwrap_err();
        assert!(matches!(err, ApiError::FoodType(_)));
    }

    #[test]
    fn no_word_characters_is_food_type_error() {
        let err = query(Some("- -"), None).validate(&blacklist()).unwrap_err();
        assert!(matches!(err, ApiError::FoodType(_)));
    }

    #[test]
    fn blacklisted_terms_are_rejected_case_insensitively() {
        for term in ["test", "ADMIN", "Debug", "system"] {
            let err = query(Some(term), None).validate(&blacklist()).unwrap_err();
            assert!(matches!(err, ApiError::FoodType(_)), "{term}");
        }
    }

    #[test]
    fn limit_parses_and_clamps() {
        let v = query(Some("rice"), Some("25"))
            .validate(&blacklist())
            .expect("valid");
        assert_eq!(v.limit, 25);

        let clamped = query(Some("rice"), Some("500"))
            .validate(&blacklist())
            .expect("valid");
        assert_eq!(clamped.limit, MAX_LIMIT);
    }

    #[test]
    fn bad_limits_are_validation_errors() {
        for bad in ["0", "-3", "ten", "1.5"] {
            let err = query(Some("rice"), Some(bad))
                .validate(&blacklist())
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{bad}");
        }
    }

    #[test]
    fn upstream_5xx_collapses_to_503() {
        let err = ApiError::Upstream {
            status: 502,
            message: "gateway".to_string(),
            body: None,
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn upstream_4xx_passes_through() {
        let err = ApiError::Upstream {
            status: 429,
            message: "limited".to_string(),
            body: None,
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response = ApiError::RateLimited {
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("42")
        );
    }

    #[tokio::test]
    async fn upstream_error_envelope_carries_upstream_status() {
        let response = ApiError::Upstream {
            status: 429,
            message: "limited".to_string(),
            body: Some(json!({ "detail": "slow down" })),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body collects");
        let body: Value = serde_json::from_slice(&bytes).expect("body is json");
        assert_eq!(body["type"], "UpstreamAPIError");
        assert_eq!(body["upstream_status"], 429);
        assert_eq!(body["upstream_body"]["detail"], "slow down");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(
            ApiError::Validation(String::new()).kind(),
            "ValidationError"
        );
        assert_eq!(ApiError::FoodType(String::new()).kind(), "FoodTypeError");
        assert_eq!(
            ApiError::Configuration(String::new()).kind(),
            "ConfigurationError"
        );
        assert_eq!(ApiError::Parsing(String::new()).kind(), "ParsingError");
    }
}
