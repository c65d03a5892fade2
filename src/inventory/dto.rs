use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub item_name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub purchase_date: Option<String>,
    pub expiry_date: Option<String>,
    pub food_id: Option<Uuid>,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub item_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub purchase_date: Option<String>,
    pub expiry_date: Option<String>,
    pub food_id: Option<Uuid>,
}
