use crate::api::foods::handlers::search_foods_handler;
use crate::api::models::AppState;
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new().route("/foods", get(search_foods_handler))
}
