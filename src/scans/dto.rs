use serde::{Deserialize, Serialize};

use super::repo::FoodScan;
use crate::foods::nutrition::PortionNutrition;
use crate::foods::repo::Food;

#[derive(Debug, Deserialize)]
pub struct ScanTextRequest {
    pub food_name: String,
    pub quantity_grams: f64,
    pub meal_type: String,
    pub date: Option<String>,
}

/// Manual entry skips inference; unspecified macros default to zero.
#[derive(Debug, Deserialize)]
pub struct ManualEntryRequest {
    pub food_name: String,
    pub quantity_grams: f64,
    pub meal_type: String,
    pub date: Option<String>,
    pub calories_per_100g: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fats_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
    #[serde(default)]
    pub sugar_g: f64,
    #[serde(default)]
    pub sodium_mg: f64,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub scan: FoodScan,
    pub food: Food,
    pub nutrition: PortionNutrition,
}
