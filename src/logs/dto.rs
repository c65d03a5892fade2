use serde::{Deserialize, Serialize};

use super::repo::MealBreakdown;
use crate::users::repo::Goals;

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<String>,
}

/// Day totals as reported to the client; water is read off the summary row,
/// not derived from entries.
#[derive(Debug, Serialize)]
pub struct TotalsWithWater {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
    pub water_ml: i32,
}

#[derive(Debug, Serialize)]
pub struct GoalValues {
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub water_ml: i32,
}

impl From<Goals> for GoalValues {
    fn from(g: Goals) -> Self {
        Self {
            calories: g.daily_calorie_goal,
            protein_g: g.protein_goal_g,
            carbs_g: g.carbs_goal_g,
            fats_g: g.fats_goal_g,
            water_ml: g.water_goal_ml,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub calorie_percent: i32,
    pub protein_percent: i32,
    pub carbs_percent: i32,
    pub fats_percent: i32,
}

#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    pub date: String,
    pub totals: TotalsWithWater,
    pub goals: GoalValues,
    pub progress: Progress,
    pub meal_breakdown: MealBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct WaterRequest {
    pub amount_ml: i32,
}

#[derive(Debug, Serialize)]
pub struct WaterResponse {
    pub date: String,
    pub water_intake_ml: i32,
    pub water_goal_ml: i32,
}

#[derive(Debug, Serialize)]
pub struct WeeklyDay {
    pub date: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct WeeklyAverages {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// Trailing 7-day window; days without a stored summary are simply absent.
#[derive(Debug, Serialize)]
pub struct WeeklySummaryResponse {
    pub period: String,
    pub daily_breakdown: Vec<WeeklyDay>,
    pub averages: WeeklyAverages,
}
