use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, Food};
use super::services;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods/search", get(search_foods))
        .route("/foods/:id", get(get_food))
}

#[instrument(skip(state))]
pub async fn search_foods(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<Food>>, ApiError> {
    let query = q.query.trim();
    if query.len() < 2 {
        return Err(ApiError::Validation(
            "query must be at least 2 characters".into(),
        ));
    }
    Ok(Json(services::search_or_suggest(&state, query).await?))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Food>, ApiError> {
    let food = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("food not found".into()))?;
    Ok(Json(food))
}
