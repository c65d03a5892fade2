use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub health_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub dietary_preferences: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl From<User> for ProfileResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            age: u.age,
            gender: u.gender,
            health_conditions: u.health_conditions,
            allergies: u.allergies,
            dietary_preferences: u.dietary_preferences,
            created_at: u.created_at,
        }
    }
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub health_conditions: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub dietary_preferences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalsRequest {
    pub daily_calorie_goal: Option<i32>,
    pub protein_goal_g: Option<f64>,
    pub carbs_goal_g: Option<f64>,
    pub fats_goal_g: Option<f64>,
    pub water_goal_ml: Option<i32>,
}
