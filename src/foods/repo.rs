use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::nutrition::NutrientsPer100g;

/// A nutrient profile per 100 g, deduplicated by case-insensitive name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub calories_per_100g: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub sodium_mg: f64,
    pub allergens: Vec<String>,
    pub ingredients: Vec<String>,
    pub source: String,
    pub created_at: OffsetDateTime,
}

impl Food {
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

/// Insert payload; rows are created from model estimates or manual entries.
#[derive(Debug, Clone)]
pub struct NewFood {
    pub name: String,
    pub category: String,
    pub calories_per_100g: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub sodium_mg: f64,
    pub allergens: Vec<String>,
    pub ingredients: Vec<String>,
    pub source: String,
}

const FOOD_COLUMNS: &str = "id, name, category, calories_per_100g, protein_g, carbs_g, fats_g, \
                            fiber_g, sugar_g, sodium_mg, allergens, ingredients, source, created_at";

pub async fn find_by_id(db: &PgPool, food_id: Uuid) -> sqlx::Result<Option<Food>> {
    sqlx::query_as::<_, Food>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods WHERE id = $1"
    ))
    .bind(food_id)
    .fetch_optional(db)
    .await
}

/// Exact match modulo case; used to deduplicate model-created foods.
pub async fn find_by_name(db: &PgPool, name: &str) -> sqlx::Result<Option<Food>> {
    sqlx::query_as::<_, Food>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods WHERE lower(name) = lower($1) LIMIT 1"
    ))
    .bind(name)
    .fetch_optional(db)
    .await
}

pub async fn search(db: &PgPool, query: &str, limit: i64) -> sqlx::Result<Vec<Food>> {
    let pattern = format!("%{}%", query);
    sqlx::query_as::<_, Food>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods WHERE name ILIKE $1 ORDER BY name ASC LIMIT $2"
    ))
    .bind(pattern)
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn insert(db: &PgPool, new: &NewFood) -> sqlx::Result<Food> {
    sqlx::query_as::<_, Food>(&format!(
        r#"
        INSERT INTO foods (name, category, calories_per_100g, protein_g, carbs_g, fats_g,
                           fiber_g, sugar_g, sodium_mg, allergens, ingredients, source)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {FOOD_COLUMNS}
        "#
    ))
    .bind(&new.name)
    .bind(&new.category)
    .bind(new.calories_per_100g)
    .bind(new.protein_g)
    .bind(new.carbs_g)
    .bind(new.fats_g)
    .bind(new.fiber_g)
    .bind(new.sugar_g)
    .bind(new.sodium_mg)
    .bind(&new.allergens)
    .bind(&new.ingredients)
    .bind(&new.source)
    .fetch_one(db)
    .await
}
