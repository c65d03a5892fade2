use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    DailyQuery, DailySummaryResponse, WaterRequest, WaterResponse, WeeklySummaryResponse,
};
use super::services;
use crate::auth::AuthUser;
use crate::dates;
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/logs/daily", get(daily_summary))
        .route("/logs/weekly", get(weekly_summary))
        .route("/logs/water", post(log_water))
        .route("/logs/scan/:id", delete(remove_scan))
}

#[instrument(skip(state))]
pub async fn daily_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DailyQuery>,
) -> Result<Json<DailySummaryResponse>, ApiError> {
    let date = dates::resolve(q.date.as_deref())?;
    Ok(Json(services::daily_summary(&state, user_id, date).await?))
}

#[instrument(skip(state))]
pub async fn weekly_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<WeeklySummaryResponse>, ApiError> {
    Ok(Json(services::weekly_summary(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn log_water(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<WaterRequest>,
) -> Result<Json<WaterResponse>, ApiError> {
    Ok(Json(
        services::log_water(&state, user_id, payload.amount_ml).await?,
    ))
}

#[instrument(skip(state))]
pub async fn remove_scan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    services::remove_scan(&state, user_id, id).await?;
    Ok(Json(
        serde_json::json!({ "message": "food scan removed" }),
    ))
}
