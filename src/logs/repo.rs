use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::scans::repo::MealType;

/// Per-meal slice of a day's totals; serialized into the JSONB breakdown column.
/// Rows created by the water path carry the column default `{}`, so every
/// field falls back to zero on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealBreakdown {
    pub breakfast: MealTotals,
    pub lunch: MealTotals,
    pub dinner: MealTotals,
    pub snack: MealTotals,
}

impl MealBreakdown {
    pub fn slot_mut(&mut self, meal: MealType) -> &mut MealTotals {
        match meal {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snack,
        }
    }
}

/// Whole-day nutrient totals, water excluded. Water lives on the same row but
/// is owned by the increment path, never by recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
}

/// One `daily_summaries` row; `(user_id, date)` is unique.
#[derive(Debug, Clone, FromRow)]
pub struct DailySummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fats: f64,
    pub total_fiber: f64,
    pub water_intake_ml: i32,
    pub goal_met: bool,
    pub meal_breakdown: sqlx::types::Json<MealBreakdown>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl DailySummary {
    pub fn totals(&self) -> Totals {
        Totals {
            calories: self.total_calories,
            protein: self.total_protein,
            carbs: self.total_carbs,
            fats: self.total_fats,
            fiber: self.total_fiber,
        }
    }
}

const SUMMARY_COLUMNS: &str = "id, user_id, date, total_calories, total_protein, total_carbs, \
                               total_fats, total_fiber, water_intake_ml, goal_met, \
                               meal_breakdown, created_at, updated_at";

pub async fn find(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    date: Date,
) -> sqlx::Result<Option<DailySummary>> {
    sqlx::query_as::<_, DailySummary>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM daily_summaries WHERE user_id = $1 AND date = $2"
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(executor)
    .await
}

/// Replaces totals and the breakdown for (user, date), creating the row if
/// absent. The update column set deliberately excludes `water_intake_ml`: a
/// recompute must never reset concurrently logged water.
pub async fn upsert_totals(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    date: Date,
    totals: &Totals,
    breakdown: &MealBreakdown,
) -> sqlx::Result<DailySummary> {
    sqlx::query_as::<_, DailySummary>(&format!(
        r#"
        INSERT INTO daily_summaries (user_id, date, total_calories, total_protein,
                                     total_carbs, total_fats, total_fiber, meal_breakdown)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id, date) DO UPDATE SET
            total_calories = EXCLUDED.total_calories,
            total_protein = EXCLUDED.total_protein,
            total_carbs = EXCLUDED.total_carbs,
            total_fats = EXCLUDED.total_fats,
            total_fiber = EXCLUDED.total_fiber,
            meal_breakdown = EXCLUDED.meal_breakdown,
            updated_at = now()
        RETURNING {SUMMARY_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(date)
    .bind(totals.calories)
    .bind(totals.protein)
    .bind(totals.carbs)
    .bind(totals.fats)
    .bind(totals.fiber)
    .bind(sqlx::types::Json(breakdown))
    .fetch_one(executor)
    .await
}

/// Atomic counter add done in one statement at the storage layer. Concurrent
/// calls for the same (user, date) serialize on the row and no increment is
/// lost; a concurrent totals upsert touches a disjoint column set.
pub async fn increment_water(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    date: Date,
    amount_ml: i32,
) -> sqlx::Result<DailySummary> {
    sqlx::query_as::<_, DailySummary>(&format!(
        r#"
        INSERT INTO daily_summaries (user_id, date, water_intake_ml)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, date) DO UPDATE SET
            water_intake_ml = daily_summaries.water_intake_ml + EXCLUDED.water_intake_ml,
            updated_at = now()
        RETURNING {SUMMARY_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(date)
    .bind(amount_ml)
    .fetch_one(executor)
    .await
}

pub async fn list_between(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    from: Date,
    to: Date,
) -> sqlx::Result<Vec<DailySummary>> {
    sqlx::query_as::<_, DailySummary>(&format!(
        r#"
        SELECT {SUMMARY_COLUMNS} FROM daily_summaries
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakdown_slots_map_to_meal_types() {
        let mut breakdown = MealBreakdown::default();
        breakdown.slot_mut(MealType::Lunch).calories = 450.0;
        assert_eq!(breakdown.lunch.calories, 450.0);
        assert_eq!(breakdown.breakfast.calories, 0.0);
    }

    #[test]
    fn breakdown_round_trips_through_json() {
        let mut breakdown = MealBreakdown::default();
        breakdown.breakfast = MealTotals {
            calories: 300.0,
            protein: 15.0,
            carbs: 45.0,
            fats: 7.5,
        };
        let json = serde_json::to_string(&breakdown).unwrap();
        let back: MealBreakdown = serde_json::from_str(&json).unwrap();
        assert_eq!(back, breakdown);
    }

    #[test]
    fn empty_jsonb_default_deserializes() {
        let breakdown: MealBreakdown = serde_json::from_str("{}").unwrap();
        assert_eq!(breakdown, MealBreakdown::default());
    }
}
