use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Full user row. Nutrition goals live here so the aggregator can read them
/// alongside the profile (defaults applied at the schema level).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub health_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub dietary_preferences: Vec<String>,
    pub daily_calorie_goal: i32,
    pub protein_goal_g: f64,
    pub carbs_goal_g: f64,
    pub fats_goal_g: f64,
    pub water_goal_ml: i32,
    pub created_at: OffsetDateTime,
}

pub(crate) const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, age, gender, health_conditions, allergies, \
     dietary_preferences, daily_calorie_goal, protein_goal_g, carbs_goal_g, fats_goal_g, \
     water_goal_ml, created_at";

pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn find_by_id(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn create(
    db: &PgPool,
    email: &str,
    password_hash: &str,
    full_name: &str,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password_hash, full_name)
        VALUES ($1, $2, $3)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .fetch_one(db)
    .await
}
