use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::api::models::{AppState, HealthQuery, HealthResponse};
use crate::upstream::UpstreamStatus;

/// GET /health — the service itself is always healthy; the optional
/// upstream probe can only degrade the `upstream` field.
pub async fn health_handler(
    State(state): State<AppState>,
    Query(params): Query<HealthQuery>,
) -> Json<HealthResponse> {
    let upstream = if params.probe {
        Some(match &state.upstream {
            Some(client) => client.probe().await,
            None => UpstreamStatus::NotConfigured,
        })
    } else {
        None
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        timestamp: Utc::now().to_rfc3339(),
        api_key_configured: state.upstream.is_some(),
        upstream,
    })
}
