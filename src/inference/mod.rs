use axum::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::foods::repo::Food;

mod gemini;

pub use gemini::GeminiClient;

/// Nutrient profile per 100 g as estimated by the model. Field names mirror
/// the JSON the prompts ask for; everything defaults so a sparse reply still
/// deserializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientEstimate {
    #[serde(default)]
    pub food_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub calories_per_100g: f64,
    #[serde(default)]
    pub protein_grams: f64,
    #[serde(default)]
    pub carbs_grams: f64,
    #[serde(default)]
    pub fats_grams: f64,
    #[serde(default)]
    pub fiber_grams: f64,
    #[serde(default)]
    pub sugar_grams: f64,
    #[serde(default)]
    pub sodium_mg: f64,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub estimated_quantity_grams: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl NutrientEstimate {
    /// The model reports unidentifiable food by answering a "not found" style
    /// name rather than an error.
    pub fn is_recognized(&self) -> bool {
        let name = self.food_name.trim();
        !name.is_empty() && !name.to_lowercase().contains("not found")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSuggestion {
    #[serde(default)]
    pub meal_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub primary_ingredients: Vec<String>,
    #[serde(default)]
    pub estimated_prep_time: String,
    #[serde(default, rename = "type")]
    pub meal_kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthAdvice {
    pub suitability: String, // "good" | "bad" | "neutral"
    pub reason: String,
}

impl HealthAdvice {
    pub fn neutral(reason: &str) -> Self {
        Self {
            suitability: "neutral".into(),
            reason: reason.into(),
        }
    }
}

/// Boundary to the external AI collaborator. Injected on `AppState` so tests
/// substitute a fake; failures must never corrupt stored entries.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn nutrition_from_text(&self, food_name: &str) -> anyhow::Result<NutrientEstimate>;

    async fn nutrition_from_image(
        &self,
        image: Bytes,
        mime_type: &str,
    ) -> anyhow::Result<NutrientEstimate>;

    async fn meal_suggestions(&self, ingredients: &[String])
        -> anyhow::Result<Vec<MealSuggestion>>;

    async fn health_advice(
        &self,
        food: &Food,
        allergies: &[String],
        conditions: &[String],
    ) -> anyhow::Result<HealthAdvice>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_deserializes_with_sparse_fields() {
        let est: NutrientEstimate =
            serde_json::from_str(r#"{"foodName":"Banana","caloriesPer100g":89}"#).unwrap();
        assert_eq!(est.food_name, "Banana");
        assert_eq!(est.calories_per_100g, 89.0);
        assert_eq!(est.protein_grams, 0.0);
        assert!(est.allergens.is_empty());
        assert!(est.confidence.is_none());
    }

    #[test]
    fn recognition_check() {
        let mut est: NutrientEstimate = serde_json::from_str("{}").unwrap();
        assert!(!est.is_recognized());
        est.food_name = "Food not found".into();
        assert!(!est.is_recognized());
        est.food_name = "Porridge".into();
        assert!(est.is_recognized());
    }

    #[test]
    fn suggestion_accepts_type_field() {
        let s: MealSuggestion = serde_json::from_str(
            r#"{"mealName":"Omelette","description":"Eggs.","primaryIngredients":["eggs"],"estimatedPrepTime":"10 mins","type":"Breakfast"}"#,
        )
        .unwrap();
        assert_eq!(s.meal_name, "Omelette");
        assert_eq!(s.meal_kind, "Breakfast");
    }
}
