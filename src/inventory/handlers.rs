use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateItemRequest, UpdateItemRequest};
use super::repo::{self, InventoryItem, ItemPatch, NewItem};
use crate::auth::AuthUser;
use crate::dates;
use crate::error::ApiError;
use crate::inference::MealSuggestion;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_items).post(create_item))
        .route("/inventory/suggestions", get(meal_suggestions))
        .route("/inventory/:id", put(update_item).delete(delete_item))
}

fn parse_opt_date(s: Option<&str>) -> Result<Option<Date>, ApiError> {
    s.map(dates::parse_iso_date).transpose()
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    Ok(Json(repo::list_by_user(&state.db, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    let item_name = payload.item_name.trim();
    if item_name.is_empty() {
        return Err(ApiError::Validation("item_name is required".into()));
    }
    if !payload.quantity.is_finite() || payload.quantity < 0.0 {
        return Err(ApiError::Validation(
            "quantity must be a non-negative number".into(),
        ));
    }

    let item = repo::insert(
        &state.db,
        &NewItem {
            user_id,
            food_id: payload.food_id,
            item_name: item_name.to_string(),
            quantity: payload.quantity,
            unit: payload.unit.unwrap_or_else(|| "pieces".into()),
            purchase_date: parse_opt_date(payload.purchase_date.as_deref())?,
            expiry_date: parse_opt_date(payload.expiry_date.as_deref())?,
        },
    )
    .await?;
    info!(user_id = %user_id, item_id = %item.id, "inventory item added");
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    if let Some(q) = payload.quantity {
        if !q.is_finite() || q < 0.0 {
            return Err(ApiError::Validation(
                "quantity must be a non-negative number".into(),
            ));
        }
    }
    let patch = ItemPatch {
        food_id: payload.food_id,
        item_name: payload.item_name,
        quantity: payload.quantity,
        unit: payload.unit,
        purchase_date: parse_opt_date(payload.purchase_date.as_deref())?,
        expiry_date: parse_opt_date(payload.expiry_date.as_deref())?,
    };
    let item = repo::update(&state.db, user_id, id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("inventory item not found".into()))?;
    Ok(Json(item))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("inventory item not found".into()));
    }
    info!(user_id = %user_id, item_id = %id, "inventory item deleted");
    Ok(Json(serde_json::json!({ "message": "inventory item deleted" })))
}

/// An empty pantry short-circuits to an empty list without calling the model.
#[instrument(skip(state))]
pub async fn meal_suggestions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<MealSuggestion>>, ApiError> {
    let names = repo::distinct_item_names(&state.db, user_id).await?;
    if names.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let suggestions = state.inference.meal_suggestions(&names).await.map_err(|e| {
        warn!(error = %e, user_id = %user_id, "meal suggestion inference failed");
        ApiError::Inference("could not generate meal suggestions right now".into())
    })?;
    Ok(Json(suggestions))
}
