pub mod foods;
pub mod health;
pub mod models;

// Re-exports
pub use models::*;

use axum::{
    http::{StatusCode, Uri},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::rate_limit::rate_limit_middleware;

/// Assemble the application router with all middleware applied
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .merge(health::routes())
        .merge(foods::routes())
        .fallback(not_found_handler)
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// GET / — static description of the API surface
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "name": "Food Search API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Gateway over USDA FoodData Central returning normalized calorie and macronutrient data",
        "endpoints": {
            "GET /": "This document",
            "GET /health": "Service health; add ?probe=true to check upstream reachability",
            "GET /foods": "Search foods by name: ?type=<name>&limit=<1-50>"
        }
    }))
}

/// Fallback for unmatched routes
pub async fn not_found_handler(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "type": "NotFoundError",
            "path": uri.path(),
            "timestamp": Utc::now().to_rfc3339(),
            "message": format!("Route {} does not exist", uri.path()),
        })),
    )
}
