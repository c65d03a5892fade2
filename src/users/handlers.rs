use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{ProfileResponse, UpdateGoalsRequest, UpdateProfileRequest};
use super::repo::{self, Goals};
use crate::auth::{repo as auth_repo, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/profile",
            get(get_profile).put(update_profile),
        )
        .route("/users/goals", get(get_goals).put(update_goals))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = auth_repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = repo::update_profile(&state.db, user_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    info!(user_id = %user_id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Goals>, ApiError> {
    let goals = repo::goals(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(goals))
}

#[instrument(skip(state, payload))]
pub async fn update_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateGoalsRequest>,
) -> Result<Json<Goals>, ApiError> {
    let goals = repo::update_goals(&state.db, user_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    info!(user_id = %user_id, "goals updated");
    Ok(Json(goals))
}
