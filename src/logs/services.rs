use time::{Date, Duration};
use tracing::info;
use uuid::Uuid;

use super::dto::{
    DailySummaryResponse, GoalValues, Progress, TotalsWithWater, WaterResponse, WeeklyAverages,
    WeeklyDay, WeeklySummaryResponse,
};
use super::repo::{self, DailySummary, MealBreakdown, Totals};
use crate::dates;
use crate::error::ApiError;
use crate::foods::nutrition::round2;
use crate::scans::repo::{self as scans_repo, ScanWithFood};
use crate::state::AppState;
use crate::users::repo::{self as users_repo, Goals};

/// Folds a day's scans into overall totals and the per-meal breakdown. Each
/// portion is rounded before summation (calories to whole kcal, macros to two
/// decimals); stored summaries are sums of those rounded portions.
pub fn aggregate(scans: &[ScanWithFood]) -> (Totals, MealBreakdown) {
    let mut totals = Totals::default();
    let mut breakdown = MealBreakdown::default();
    for scan in scans {
        let portion = scan.per_100g().portion(scan.quantity_grams);
        totals.calories += portion.calories;
        totals.protein += portion.protein;
        totals.carbs += portion.carbs;
        totals.fats += portion.fats;
        totals.fiber += portion.fiber;

        let slot = breakdown.slot_mut(scan.meal_type);
        slot.calories += portion.calories;
        slot.protein += portion.protein;
        slot.carbs += portion.carbs;
        slot.fats += portion.fats;
    }
    (totals, breakdown)
}

/// Percent of goal reached; a zero or missing goal reads as 0% rather than
/// dividing by zero.
pub fn percent_of(total: f64, goal: f64) -> i32 {
    if goal <= 0.0 {
        0
    } else {
        (total / goal * 100.0).round() as i32
    }
}

pub fn progress(totals: &Totals, goals: &Goals) -> Progress {
    Progress {
        calorie_percent: percent_of(totals.calories, goals.daily_calorie_goal as f64),
        protein_percent: percent_of(totals.protein, goals.protein_goal_g),
        carbs_percent: percent_of(totals.carbs, goals.carbs_goal_g),
        fats_percent: percent_of(totals.fats, goals.fats_goal_g),
    }
}

/// Arithmetic means over the rows that exist; absent days do not count into
/// the denominator.
pub fn weekly_averages(rows: &[DailySummary]) -> WeeklyAverages {
    if rows.is_empty() {
        return WeeklyAverages {
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fats: 0.0,
        };
    }
    let n = rows.len() as f64;
    WeeklyAverages {
        calories: (rows.iter().map(|r| r.total_calories).sum::<f64>() / n).round(),
        protein: round2(rows.iter().map(|r| r.total_protein).sum::<f64>() / n),
        carbs: round2(rows.iter().map(|r| r.total_carbs).sum::<f64>() / n),
        fats: round2(rows.iter().map(|r| r.total_fats).sum::<f64>() / n),
    }
}

fn build_response(
    date: Date,
    totals: Totals,
    breakdown: MealBreakdown,
    water_ml: i32,
    goals: &Goals,
) -> DailySummaryResponse {
    DailySummaryResponse {
        date: dates::format_iso_date(date),
        progress: progress(&totals, goals),
        totals: TotalsWithWater {
            calories: totals.calories,
            protein: totals.protein,
            carbs: totals.carbs,
            fats: totals.fats,
            fiber: totals.fiber,
            water_ml,
        },
        goals: GoalValues::from(*goals),
        meal_breakdown: breakdown,
    }
}

/// Recompute-on-read. Reading the day's scans and writing the summary happen
/// in one transaction, so concurrent recomputes for the same (user, date)
/// cannot interleave into a half-written row; last write wins, which is safe
/// because the recompute is a deterministic function of the entry set.
pub async fn daily_summary(
    state: &AppState,
    user_id: Uuid,
    date: Date,
) -> Result<DailySummaryResponse, ApiError> {
    let goals = users_repo::goals(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let mut tx = state.db.begin().await?;
    let scans = scans_repo::list_for_date(&mut *tx, user_id, date).await?;

    let (totals, breakdown) = if scans.is_empty() {
        if repo::find(&mut *tx, user_id, date).await?.is_none() {
            // Nothing logged and nothing stored: answer zeros without
            // creating a row for an inactive day.
            tx.commit().await?;
            return Ok(build_response(
                date,
                Totals::default(),
                MealBreakdown::default(),
                0,
                &goals,
            ));
        }
        // A row exists from an earlier water log; store the zero recompute.
        (Totals::default(), MealBreakdown::default())
    } else {
        aggregate(&scans)
    };

    let row = repo::upsert_totals(&mut *tx, user_id, date, &totals, &breakdown).await?;
    tx.commit().await?;

    Ok(build_response(date, totals, breakdown, row.water_intake_ml, &goals))
}

pub async fn log_water(
    state: &AppState,
    user_id: Uuid,
    amount_ml: i32,
) -> Result<WaterResponse, ApiError> {
    if amount_ml <= 0 {
        return Err(ApiError::Validation(
            "amount_ml must be a positive number".into(),
        ));
    }
    let goals = users_repo::goals(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let today = dates::today_utc();
    let row = repo::increment_water(&state.db, user_id, today, amount_ml).await?;
    info!(user_id = %user_id, amount_ml, total_ml = row.water_intake_ml, "water logged");

    Ok(WaterResponse {
        date: dates::format_iso_date(today),
        water_intake_ml: row.water_intake_ml,
        water_goal_ml: goals.water_goal_ml,
    })
}

pub async fn weekly_summary(
    state: &AppState,
    user_id: Uuid,
) -> Result<WeeklySummaryResponse, ApiError> {
    let end = dates::today_utc();
    let start = end - Duration::days(7);
    let rows = repo::list_between(&state.db, user_id, start, end).await?;

    let daily_breakdown = rows
        .iter()
        .map(|r| WeeklyDay {
            date: dates::format_iso_date(r.date),
            calories: r.total_calories,
            protein: r.total_protein,
            carbs: r.total_carbs,
            fats: r.total_fats,
        })
        .collect();
    let averages = weekly_averages(&rows);

    Ok(WeeklySummaryResponse {
        period: format!(
            "{} to {}",
            dates::format_iso_date(start),
            dates::format_iso_date(end)
        ),
        daily_breakdown,
        averages,
    })
}

/// Deletion does not touch the summary; the next daily read re-derives the
/// totals from whatever scans remain.
pub async fn remove_scan(state: &AppState, user_id: Uuid, scan_id: Uuid) -> Result<(), ApiError> {
    if !scans_repo::delete_one(&state.db, user_id, scan_id).await? {
        return Err(ApiError::NotFound("scan not found".into()));
    }
    info!(user_id = %user_id, scan_id = %scan_id, "food scan removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scans::repo::MealType;
    use time::macros::date;
    use time::OffsetDateTime;

    fn scan(meal_type: MealType, calories_per_100g: f64, quantity_grams: f64) -> ScanWithFood {
        ScanWithFood {
            id: Uuid::new_v4(),
            quantity_grams,
            meal_type,
            food_name: "test food".into(),
            calories_per_100g,
            protein_g: 0.0,
            carbs_g: 0.0,
            fats_g: 0.0,
            fiber_g: 0.0,
            sugar_g: 0.0,
            sodium_mg: 0.0,
            allergen_warning: false,
        }
    }

    fn goals() -> Goals {
        Goals {
            daily_calorie_goal: 2000,
            protein_goal_g: 50.0,
            carbs_goal_g: 250.0,
            fats_goal_g: 65.0,
            water_goal_ml: 2000,
        }
    }

    fn summary_row(d: Date, calories: f64, protein: f64, carbs: f64, fats: f64) -> DailySummary {
        DailySummary {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: d,
            total_calories: calories,
            total_protein: protein,
            total_carbs: carbs,
            total_fats: fats,
            total_fiber: 0.0,
            water_intake_ml: 0,
            goal_met: false,
            meal_breakdown: sqlx::types::Json(MealBreakdown::default()),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn breakfast_and_lunch_sum_to_daily_totals() {
        let scans = vec![
            scan(MealType::Breakfast, 200.0, 150.0), // 300 kcal
            scan(MealType::Lunch, 400.0, 100.0),     // 400 kcal
        ];
        let (totals, breakdown) = aggregate(&scans);
        assert_eq!(totals.calories, 700.0);
        assert_eq!(breakdown.breakfast.calories, 300.0);
        assert_eq!(breakdown.lunch.calories, 400.0);
        assert_eq!(breakdown.dinner.calories, 0.0);

        let p = progress(&totals, &goals());
        assert_eq!(p.calorie_percent, 35);
    }

    #[test]
    fn portions_round_before_summation() {
        // 89 kcal/100g at 33 g is 29.37 kcal, rounded to 29 per portion.
        // Summing first would give 58.74 -> 59; the chosen policy gives 58.
        let scans = vec![
            scan(MealType::Snack, 89.0, 33.0),
            scan(MealType::Snack, 89.0, 33.0),
        ];
        let (totals, _) = aggregate(&scans);
        assert_eq!(totals.calories, 58.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let scans = vec![
            scan(MealType::Breakfast, 152.0, 87.0),
            scan(MealType::Dinner, 311.0, 243.0),
        ];
        let first = aggregate(&scans);
        let second = aggregate(&scans);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn recompute_re_derives_after_deletion() {
        let a = scan(MealType::Breakfast, 200.0, 150.0);
        let b = scan(MealType::Lunch, 400.0, 100.0);
        let (before, _) = aggregate(&[a, b.clone()]);
        assert_eq!(before.calories, 700.0);

        let (after, _) = aggregate(&[b]);
        assert_eq!(after.calories, 400.0);
    }

    #[test]
    fn empty_day_aggregates_to_zero() {
        let (totals, breakdown) = aggregate(&[]);
        assert_eq!(totals, Totals::default());
        assert_eq!(breakdown, MealBreakdown::default());
    }

    #[test]
    fn macros_accumulate_into_totals() {
        let mut s = scan(MealType::Dinner, 100.0, 200.0);
        s.protein_g = 10.0;
        s.carbs_g = 20.0;
        s.fats_g = 5.0;
        s.fiber_g = 3.0;
        let (totals, breakdown) = aggregate(&[s]);
        assert_eq!(totals.protein, 20.0);
        assert_eq!(totals.carbs, 40.0);
        assert_eq!(totals.fats, 10.0);
        assert_eq!(totals.fiber, 6.0);
        // Fiber is tracked in the day totals but not per meal.
        assert_eq!(breakdown.dinner.protein, 20.0);
        assert_eq!(breakdown.dinner.fats, 10.0);
    }

    #[test]
    fn zero_goal_reports_zero_percent() {
        assert_eq!(percent_of(300.0, 0.0), 0);
        assert_eq!(percent_of(300.0, -5.0), 0);
        assert_eq!(percent_of(0.0, 2000.0), 0);
        assert_eq!(percent_of(700.0, 2000.0), 35);
        assert_eq!(percent_of(2500.0, 2000.0), 125);
    }

    #[test]
    fn zero_calorie_goal_does_not_poison_progress() {
        let mut g = goals();
        g.daily_calorie_goal = 0;
        let (totals, _) = aggregate(&[scan(MealType::Lunch, 400.0, 100.0)]);
        let p = progress(&totals, &g);
        assert_eq!(p.calorie_percent, 0);
        assert_eq!(p.protein_percent, 0);
    }

    #[test]
    fn weekly_averages_over_present_rows_only() {
        let rows = vec![
            summary_row(date!(2025 - 03 - 03), 1800.0, 80.0, 200.0, 60.0),
            summary_row(date!(2025 - 03 - 05), 2100.0, 95.5, 230.0, 71.0),
        ];
        let avg = weekly_averages(&rows);
        assert_eq!(avg.calories, 1950.0);
        assert_eq!(avg.protein, 87.75);
        assert_eq!(avg.carbs, 215.0);
        assert_eq!(avg.fats, 65.5);
    }

    #[test]
    fn weekly_averages_empty_is_zero() {
        let avg = weekly_averages(&[]);
        assert_eq!(
            avg,
            WeeklyAverages {
                calories: 0.0,
                protein: 0.0,
                carbs: 0.0,
                fats: 0.0
            }
        );
    }

    #[test]
    fn weekly_average_calories_round_to_whole() {
        let rows = vec![
            summary_row(date!(2025 - 03 - 03), 1000.0, 0.0, 0.0, 0.0),
            summary_row(date!(2025 - 03 - 04), 1001.0, 0.0, 0.0, 0.0),
        ];
        // 1000.5 rounds to 1001 (calories are reported whole).
        assert_eq!(weekly_averages(&rows).calories, 1001.0);
    }

    #[tokio::test]
    async fn water_amount_rejected_before_any_storage_call() {
        // The fake state's pool connects lazily, so reaching storage would
        // error differently; these must fail validation up front.
        let state = AppState::fake();
        for bad in [0, -250] {
            let err = log_water(&state, Uuid::new_v4(), bad).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "accepted {bad}");
        }
    }

    #[test]
    fn response_carries_water_from_the_row() {
        let (totals, breakdown) = aggregate(&[scan(MealType::Breakfast, 200.0, 150.0)]);
        let resp = build_response(date!(2025 - 03 - 09), totals, breakdown, 750, &goals());
        assert_eq!(resp.date, "2025-03-09");
        assert_eq!(resp.totals.calories, 300.0);
        assert_eq!(resp.totals.water_ml, 750);
        assert_eq!(resp.goals.calories, 2000);
        assert_eq!(resp.progress.calorie_percent, 15);
        assert_eq!(resp.meal_breakdown.breakfast.calories, 300.0);
    }
}
