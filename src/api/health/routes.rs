use crate::api::health::handlers::health_handler;
use crate::api::models::AppState;
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
