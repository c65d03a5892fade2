use bytes::Bytes;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{ManualEntryRequest, ScanResponse, ScanTextRequest};
use super::repo::{self, MealType, NewScan};
use crate::auth::repo::{self as auth_repo, User};
use crate::dates;
use crate::error::ApiError;
use crate::foods::repo::{Food, NewFood};
use crate::foods::services::{create_or_fetch, SOURCE_GEMINI, SOURCE_USER_INPUT};
use crate::state::AppState;

/// Matches the food's listed allergens against the user's allergy list by
/// case-insensitive containment in both directions, so "tree nuts" and "nuts"
/// find each other.
pub fn detect_allergens(food_allergens: &[String], user_allergies: &[String]) -> Vec<String> {
    food_allergens
        .iter()
        .filter(|allergen| {
            let a = allergen.to_lowercase();
            user_allergies.iter().any(|user| {
                let u = user.to_lowercase();
                u.contains(&a) || a.contains(&u)
            })
        })
        .cloned()
        .collect()
}

fn validate_quantity(quantity_grams: f64) -> Result<(), ApiError> {
    if quantity_grams.is_finite() && quantity_grams > 0.0 {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "quantity_grams must be a positive number".into(),
        ))
    }
}

fn parse_meal_type(s: &str) -> Result<MealType, ApiError> {
    MealType::parse(s).ok_or_else(|| ApiError::Validation(format!("unknown meal type: {s}")))
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    auth_repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))
}

/// Shared tail of every logging path: allergen check, health advice, insert,
/// portion math. Advice trouble degrades to none; it never blocks the scan.
async fn record_scan(
    state: &AppState,
    user: &User,
    food: Food,
    quantity_grams: f64,
    meal_type: MealType,
    scan_date: Date,
    confidence: Option<f64>,
) -> Result<ScanResponse, ApiError> {
    let detected = detect_allergens(&food.allergens, &user.allergies);
    let advice = match state
        .inference
        .health_advice(&food, &user.allergies, &user.health_conditions)
        .await
    {
        Ok(a) => Some(a),
        Err(e) => {
            warn!(error = %e, food = %food.name, "health advice failed");
            None
        }
    };

    let scan = repo::insert(
        &state.db,
        &NewScan {
            user_id: user.id,
            food_id: food.id,
            quantity_grams,
            meal_type,
            scan_date,
            confidence,
            allergen_warning: !detected.is_empty(),
            detected_allergens: detected,
            health_suitability: advice.as_ref().map(|a| a.suitability.clone()),
            health_reason: advice.map(|a| a.reason),
        },
    )
    .await?;

    let nutrition = food.per_100g().portion(quantity_grams);
    info!(user_id = %user.id, scan_id = %scan.id, food = %food.name, "food logged");
    Ok(ScanResponse {
        scan,
        food,
        nutrition,
    })
}

pub async fn scan_from_text(
    state: &AppState,
    user_id: Uuid,
    req: ScanTextRequest,
) -> Result<ScanResponse, ApiError> {
    validate_quantity(req.quantity_grams)?;
    let meal_type = parse_meal_type(&req.meal_type)?;
    let scan_date = dates::resolve(req.date.as_deref())?;
    let user = load_user(state, user_id).await?;

    // Fail closed: no scan row exists until the model produced a usable
    // profile, so a collaborator outage never logs fabricated zeros.
    let estimate = state
        .inference
        .nutrition_from_text(&req.food_name)
        .await
        .map_err(|e| {
            warn!(error = %e, food_name = %req.food_name, "nutrition inference failed");
            ApiError::Inference("could not analyze food right now, please retry".into())
        })?;
    if !estimate.is_recognized() {
        return Err(ApiError::Validation(format!(
            "could not find nutritional information for \"{}\"",
            req.food_name
        )));
    }

    let confidence = estimate.confidence.or(Some(0.85));
    let food = create_or_fetch(&state.db, NewFood::from_estimate(&estimate, SOURCE_GEMINI)).await?;
    record_scan(
        state,
        &user,
        food,
        req.quantity_grams,
        meal_type,
        scan_date,
        confidence,
    )
    .await
}

pub async fn scan_from_image(
    state: &AppState,
    user_id: Uuid,
    image: Bytes,
    mime_type: &str,
    quantity_grams: Option<f64>,
    meal_type: &str,
    date: Option<&str>,
) -> Result<ScanResponse, ApiError> {
    if image.is_empty() {
        return Err(ApiError::Validation("image file is required".into()));
    }
    let meal_type = parse_meal_type(meal_type)?;
    let scan_date = dates::resolve(date)?;
    let user = load_user(state, user_id).await?;

    let estimate = state
        .inference
        .nutrition_from_image(image, mime_type)
        .await
        .map_err(|e| {
            warn!(error = %e, "image inference failed");
            ApiError::Inference("could not analyze the image right now, please retry".into())
        })?;
    if !estimate.is_recognized() {
        return Err(ApiError::Validation(
            "could not detect a food item in the image, please try a clearer picture".into(),
        ));
    }

    // The client may omit the quantity; fall back to what the model saw on
    // the plate.
    let quantity = quantity_grams
        .or(estimate.estimated_quantity_grams)
        .ok_or_else(|| ApiError::Validation("quantity_grams is required".into()))?;
    validate_quantity(quantity)?;

    let confidence = estimate.confidence.or(Some(0.9));
    let food = create_or_fetch(&state.db, NewFood::from_estimate(&estimate, SOURCE_GEMINI)).await?;
    record_scan(
        state, &user, food, quantity, meal_type, scan_date, confidence,
    )
    .await
}

pub async fn manual_entry(
    state: &AppState,
    user_id: Uuid,
    req: ManualEntryRequest,
) -> Result<ScanResponse, ApiError> {
    let name = req.food_name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("food_name is required".into()));
    }
    validate_quantity(req.quantity_grams)?;
    if !req.calories_per_100g.is_finite() || req.calories_per_100g < 0.0 {
        return Err(ApiError::Validation(
            "calories_per_100g must be a non-negative number".into(),
        ));
    }
    let meal_type = parse_meal_type(&req.meal_type)?;
    let scan_date = dates::resolve(req.date.as_deref())?;
    let user = load_user(state, user_id).await?;

    let food = create_or_fetch(
        &state.db,
        NewFood {
            name: name.to_string(),
            category: "other".into(),
            calories_per_100g: req.calories_per_100g,
            protein_g: req.protein_g,
            carbs_g: req.carbs_g,
            fats_g: req.fats_g,
            fiber_g: req.fiber_g,
            sugar_g: req.sugar_g,
            sodium_mg: req.sodium_mg,
            allergens: Vec::new(),
            ingredients: Vec::new(),
            source: SOURCE_USER_INPUT.into(),
        },
    )
    .await?;

    record_scan(
        state,
        &user,
        food,
        req.quantity_grams,
        meal_type,
        scan_date,
        Some(1.0),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn allergen_match_is_case_insensitive() {
        let detected = detect_allergens(&strings(&["Peanuts"]), &strings(&["peanuts"]));
        assert_eq!(detected, vec!["Peanuts"]);
    }

    #[test]
    fn allergen_containment_works_both_directions() {
        // User says "nuts", food lists "tree nuts".
        let detected = detect_allergens(&strings(&["tree nuts"]), &strings(&["nuts"]));
        assert_eq!(detected, vec!["tree nuts"]);

        // User says "cow milk", food lists "milk".
        let detected = detect_allergens(&strings(&["milk"]), &strings(&["cow milk"]));
        assert_eq!(detected, vec!["milk"]);
    }

    #[test]
    fn unrelated_allergens_do_not_match() {
        let detected = detect_allergens(&strings(&["gluten", "soy"]), &strings(&["shellfish"]));
        assert!(detected.is_empty());

        assert!(detect_allergens(&[], &strings(&["peanuts"])).is_empty());
        assert!(detect_allergens(&strings(&["peanuts"]), &[]).is_empty());
    }

    #[test]
    fn quantity_validation() {
        assert!(validate_quantity(150.0).is_ok());
        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-20.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
        assert!(validate_quantity(f64::INFINITY).is_err());
    }

    #[test]
    fn meal_type_errors_are_validation() {
        assert!(parse_meal_type("lunch").is_ok());
        let err = parse_meal_type("brunch").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
