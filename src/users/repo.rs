use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::dto::{UpdateGoalsRequest, UpdateProfileRequest};
use crate::auth::repo::{User, USER_COLUMNS};

/// Per-user target values; read-only from the aggregator's perspective.
#[derive(Debug, Clone, Copy, Serialize, FromRow)]
pub struct Goals {
    pub daily_calorie_goal: i32,
    pub protein_goal_g: f64,
    pub carbs_goal_g: f64,
    pub fats_goal_g: f64,
    pub water_goal_ml: i32,
}

const GOAL_COLUMNS: &str =
    "daily_calorie_goal, protein_goal_g, carbs_goal_g, fats_goal_g, water_goal_ml";

/// `None` means the user does not exist; goals themselves always resolve
/// because the schema carries defaults.
pub async fn goals(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Goals>> {
    sqlx::query_as::<_, Goals>(&format!(
        "SELECT {GOAL_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn update_profile(
    db: &PgPool,
    user_id: Uuid,
    p: &UpdateProfileRequest,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            full_name = COALESCE($2, full_name),
            age = COALESCE($3, age),
            gender = COALESCE($4, gender),
            health_conditions = COALESCE($5, health_conditions),
            allergies = COALESCE($6, allergies),
            dietary_preferences = COALESCE($7, dietary_preferences)
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&p.full_name)
    .bind(p.age)
    .bind(&p.gender)
    .bind(&p.health_conditions)
    .bind(&p.allergies)
    .bind(&p.dietary_preferences)
    .fetch_optional(db)
    .await
}

pub async fn update_goals(
    db: &PgPool,
    user_id: Uuid,
    g: &UpdateGoalsRequest,
) -> sqlx::Result<Option<Goals>> {
    sqlx::query_as::<_, Goals>(&format!(
        r#"
        UPDATE users SET
            daily_calorie_goal = COALESCE($2, daily_calorie_goal),
            protein_goal_g = COALESCE($3, protein_goal_g),
            carbs_goal_g = COALESCE($4, carbs_goal_g),
            fats_goal_g = COALESCE($5, fats_goal_g),
            water_goal_ml = COALESCE($6, water_goal_ml)
        WHERE id = $1
        RETURNING {GOAL_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(g.daily_calorie_goal)
    .bind(g.protein_goal_g)
    .bind(g.carbs_goal_g)
    .bind(g.fats_goal_g)
    .bind(g.water_goal_ml)
    .fetch_optional(db)
    .await
}
