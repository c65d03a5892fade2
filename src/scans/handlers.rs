use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use tracing::instrument;

use super::dto::{ManualEntryRequest, ScanResponse, ScanTextRequest};
use super::services;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods/scan", post(scan_text))
        .route("/foods/scan-image", post(scan_image))
        .route("/foods/manual-entry", post(manual_entry))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

#[instrument(skip(state, payload))]
pub async fn scan_text(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ScanTextRequest>,
) -> Result<(StatusCode, Json<ScanResponse>), ApiError> {
    let resp = services::scan_from_text(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// Multipart form: an `image` file plus `meal_type`, optional
/// `quantity_grams` and `date` text fields. The image is forwarded to the
/// model and discarded.
#[instrument(skip(state, mp))]
pub async fn scan_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<ScanResponse>), ApiError> {
    let mut image: Option<(Bytes, String)> = None;
    let mut meal_type: Option<String> = None;
    let mut quantity_grams: Option<f64> = None;
    let mut date: Option<String> = None;

    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("image") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "image/jpeg".into());
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::Validation("could not read image field".into()))?;
                image = Some((data, content_type));
            }
            Some("meal_type") => {
                meal_type = Some(read_text(field).await?);
            }
            Some("quantity_grams") => {
                let raw = read_text(field).await?;
                quantity_grams = Some(raw.trim().parse().map_err(|_| {
                    ApiError::Validation("quantity_grams must be a number".into())
                })?);
            }
            Some("date") => {
                date = Some(read_text(field).await?);
            }
            _ => {}
        }
    }

    let (bytes, mime_type) =
        image.ok_or_else(|| ApiError::Validation("image file is required".into()))?;
    let meal_type =
        meal_type.ok_or_else(|| ApiError::Validation("meal_type is required".into()))?;

    let resp = services::scan_from_image(
        &state,
        user_id,
        bytes,
        &mime_type,
        quantity_grams,
        &meal_type,
        date.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(state, payload))]
pub async fn manual_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ManualEntryRequest>,
) -> Result<(StatusCode, Json<ScanResponse>), ApiError> {
    let resp = services::manual_entry(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart field".into()))
}
