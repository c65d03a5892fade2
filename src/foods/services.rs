use sqlx::PgPool;
use tracing::warn;

use super::repo::{self, Food, NewFood};
use crate::error::ApiError;
use crate::inference::NutrientEstimate;
use crate::state::AppState;

pub const SOURCE_GEMINI: &str = "gemini";
pub const SOURCE_USER_INPUT: &str = "user_input";

impl NewFood {
    pub fn from_estimate(estimate: &NutrientEstimate, source: &str) -> Self {
        Self {
            name: estimate.food_name.clone(),
            category: estimate
                .category
                .clone()
                .unwrap_or_else(|| "other".into()),
            calories_per_100g: estimate.calories_per_100g,
            protein_g: estimate.protein_grams,
            carbs_g: estimate.carbs_grams,
            fats_g: estimate.fats_grams,
            fiber_g: estimate.fiber_grams,
            sugar_g: estimate.sugar_grams,
            sodium_mg: estimate.sodium_mg,
            allergens: estimate.allergens.clone(),
            ingredients: estimate.ingredients.clone(),
            source: source.into(),
        }
    }
}

/// Foods are shared across users and deduplicated by case-insensitive name.
pub async fn create_or_fetch(db: &PgPool, new: NewFood) -> Result<Food, ApiError> {
    if let Some(existing) = repo::find_by_name(db, &new.name).await? {
        return Ok(existing);
    }
    Ok(repo::insert(db, &new).await?)
}

/// Database lookup first; on a miss ask the model and store what it returns.
/// Inference trouble degrades to an empty result here because search is a
/// suggestion surface, not a logging path.
pub async fn search_or_suggest(state: &AppState, query: &str) -> Result<Vec<Food>, ApiError> {
    let found = repo::search(&state.db, query, 20).await?;
    if !found.is_empty() {
        return Ok(found);
    }

    let estimate = match state.inference.nutrition_from_text(query).await {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, query, "nutrition inference failed during search");
            return Ok(Vec::new());
        }
    };
    if !estimate.is_recognized() {
        return Ok(Vec::new());
    }

    let food = create_or_fetch(&state.db, NewFood::from_estimate(&estimate, SOURCE_GEMINI)).await?;
    Ok(vec![food])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate() -> NutrientEstimate {
        serde_json::from_str(
            r#"{
                "foodName": "Oatmeal",
                "category": "grains",
                "caloriesPer100g": 389,
                "proteinGrams": 16.9,
                "carbsGrams": 66.3,
                "fatsGrams": 6.9,
                "fiberGrams": 10.6,
                "sugarGrams": 0.99,
                "sodiumMg": 2,
                "allergens": ["gluten"],
                "ingredients": ["oats"],
                "confidence": 0.92
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn new_food_copies_estimate_fields() {
        let new = NewFood::from_estimate(&estimate(), SOURCE_GEMINI);
        assert_eq!(new.name, "Oatmeal");
        assert_eq!(new.category, "grains");
        assert_eq!(new.calories_per_100g, 389.0);
        assert_eq!(new.allergens, vec!["gluten"]);
        assert_eq!(new.source, "gemini");
    }

    #[test]
    fn missing_category_defaults_to_other() {
        let mut est = estimate();
        est.category = None;
        let new = NewFood::from_estimate(&est, SOURCE_USER_INPUT);
        assert_eq!(new.category, "other");
        assert_eq!(new.source, "user_input");
    }
}
