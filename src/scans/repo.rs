use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::foods::nutrition::NutrientsPer100g;

/// Fixed meal categories; maps to the Postgres `meal_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "meal_type", rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snack" => Some(Self::Snack),
            _ => None,
        }
    }
}

/// One logged consumption event. Immutable after creation except deletion;
/// `scan_date` is the attribution day and may differ from `scanned_at` only
/// by explicit override.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodScan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity_grams: f64,
    pub meal_type: MealType,
    pub scan_date: Date,
    pub scanned_at: OffsetDateTime,
    pub confidence: Option<f64>,
    pub detected_allergens: Vec<String>,
    pub allergen_warning: bool,
    pub health_suitability: Option<String>,
    pub health_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewScan {
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity_grams: f64,
    pub meal_type: MealType,
    pub scan_date: Date,
    pub confidence: Option<f64>,
    pub detected_allergens: Vec<String>,
    pub allergen_warning: bool,
    pub health_suitability: Option<String>,
    pub health_reason: Option<String>,
}

const SCAN_COLUMNS: &str = "id, user_id, food_id, quantity_grams, meal_type, scan_date, \
                            scanned_at, confidence, detected_allergens, allergen_warning, \
                            health_suitability, health_reason";

pub async fn insert(db: &PgPool, new: &NewScan) -> sqlx::Result<FoodScan> {
    sqlx::query_as::<_, FoodScan>(&format!(
        r#"
        INSERT INTO food_scans (user_id, food_id, quantity_grams, meal_type, scan_date,
                                confidence, detected_allergens, allergen_warning,
                                health_suitability, health_reason)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {SCAN_COLUMNS}
        "#
    ))
    .bind(new.user_id)
    .bind(new.food_id)
    .bind(new.quantity_grams)
    .bind(new.meal_type)
    .bind(new.scan_date)
    .bind(new.confidence)
    .bind(&new.detected_allergens)
    .bind(new.allergen_warning)
    .bind(&new.health_suitability)
    .bind(&new.health_reason)
    .fetch_one(db)
    .await
}

/// A scan joined with its food's nutrient snapshot, the shape the daily
/// aggregator consumes.
#[derive(Debug, Clone, FromRow)]
pub struct ScanWithFood {
    pub id: Uuid,
    pub quantity_grams: f64,
    pub meal_type: MealType,
    pub food_name: String,
    pub calories_per_100g: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub sodium_mg: f64,
    pub allergen_warning: bool,
}

impl ScanWithFood {
    pub fn per_100g(&self) -> NutrientsPer100g {
        NutrientsPer100g {
            calories: self.calories_per_100g,
            protein: self.protein_g,
            carbs: self.carbs_g,
            fats: self.fats_g,
            fiber: self.fiber_g,
            sugar: self.sugar_g,
            sodium_mg: self.sodium_mg,
        }
    }
}

/// All scans attributed to (user, date). Takes any executor so the aggregator
/// can run it inside its recompute transaction.
pub async fn list_for_date(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    date: Date,
) -> sqlx::Result<Vec<ScanWithFood>> {
    sqlx::query_as::<_, ScanWithFood>(
        r#"
        SELECT s.id, s.quantity_grams, s.meal_type, f.name AS food_name,
               f.calories_per_100g, f.protein_g, f.carbs_g, f.fats_g,
               f.fiber_g, f.sugar_g, f.sodium_mg, s.allergen_warning
        FROM food_scans s
        JOIN foods f ON f.id = s.food_id
        WHERE s.user_id = $1 AND s.scan_date = $2
        ORDER BY s.scanned_at ASC
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(executor)
    .await
}

/// Scoped to the owning user; `false` covers both a missing id and a foreign
/// one, so callers cannot delete across users.
pub async fn delete_one(db: &PgPool, user_id: Uuid, scan_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM food_scans WHERE id = $1 AND user_id = $2")
        .bind(scan_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_parses_known_categories() {
        assert_eq!(MealType::parse("breakfast"), Some(MealType::Breakfast));
        assert_eq!(MealType::parse("LUNCH"), Some(MealType::Lunch));
        assert_eq!(MealType::parse(" dinner "), Some(MealType::Dinner));
        assert_eq!(MealType::parse("snack"), Some(MealType::Snack));
        assert_eq!(MealType::parse("brunch"), None);
        assert_eq!(MealType::parse(""), None);
    }

    #[test]
    fn meal_type_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&MealType::Breakfast).unwrap(),
            "\"breakfast\""
        );
        let parsed: MealType = serde_json::from_str("\"snack\"").unwrap();
        assert_eq!(parsed, MealType::Snack);
    }
}
