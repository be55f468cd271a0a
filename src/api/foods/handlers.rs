use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::models::{ApiError, AppState, FoodQuery, FoodsResponse};
use crate::nutrition::{normalize_food, NormalizedFood};

pub async fn search_foods_handler(
    State(state): State<AppState>,
    Query(params): Query<FoodQuery>,
) -> Result<Json<FoodsResponse>, ApiError> {
    // Validate
    let validated = params.validate(&state.config.query_blacklist)?;

    info!(query = %validated.query, limit = validated.limit, "Searching foods");

    // Check config
    let client = state.upstream.as_ref().ok_or_else(|| {
        ApiError::Configuration("FDC_API_KEY is not configured on the server".to_string())
    })?;

    // Sanitize: collapse whitespace runs; URL encoding is the client's job
    let query = validated
        .query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    // Call upstream; status mapping and body parsing live in the client
    let mut body = client.search_foods(&query, validated.limit).await?;

    // Normalize items; a malformed entry drops without failing the batch
    let foods: Vec<NormalizedFood> = match body.get_mut("foods").map(Value::take) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| {
                let food = normalize_food(item);
                if food.is_none() {
                    warn!("Dropping malformed food item from upstream response");
                }
                food
            })
            .collect(),
        _ => Vec::new(),
    };

    info!(count = foods.len(), "Search complete");

    Ok(Json(FoodsResponse {
        query,
        limit: validated.limit,
        count: foods.len(),
        foods,
    }))
}
