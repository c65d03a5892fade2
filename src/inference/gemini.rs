use anyhow::Context;
use axum::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{HealthAdvice, InferenceClient, MealSuggestion, NutrientEstimate};
use crate::config::GeminiConfig;
use crate::foods::repo::Food;

/// Gemini `generateContent` REST client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            http: Client::new(),
        }
    }

    async fn generate(&self, parts: Vec<Part>) -> anyhow::Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("gemini returned {status}: {body}");
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .context("decode gemini response body")?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| anyhow::anyhow!("empty gemini response"))?;

        debug!(model = %self.model, chars = text.len(), "gemini reply received");
        Ok(text)
    }
}

fn nutrition_schema_prompt() -> &'static str {
    r#"Return ONLY a JSON object with this exact structure (no markdown, no extra text):
{
  "foodName": "name of the food",
  "estimatedQuantityGrams": 100,
  "category": "fruits|vegetables|grains|protein|dairy|oils|sweets|beverages|other",
  "caloriesPer100g": number,
  "proteinGrams": number,
  "carbsGrams": number,
  "fatsGrams": number,
  "fiberGrams": number,
  "sugarGrams": number,
  "sodiumMg": number,
  "allergens": ["allergen1", "allergen2"],
  "ingredients": ["ingredient1", "ingredient2"],
  "confidence": 0.95
}
All nutrient values are per 100 grams. If the item cannot be identified as food, set foodName to "not found"."#
}

/// The model often wraps its JSON in markdown fences; take the outermost
/// object or array and ignore the rest.
fn extract_json_object(text: &str) -> Option<&str> {
    lazy_static! {
        static ref OBJECT_RE: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
    }
    OBJECT_RE.find(text).map(|m| m.as_str())
}

fn extract_json_array(text: &str) -> Option<&str> {
    lazy_static! {
        static ref ARRAY_RE: Regex = Regex::new(r"\[[\s\S]*\]").unwrap();
    }
    ARRAY_RE.find(text).map(|m| m.as_str())
}

fn parse_estimate(text: &str) -> anyhow::Result<NutrientEstimate> {
    let json = extract_json_object(text)
        .ok_or_else(|| anyhow::anyhow!("no JSON object in gemini reply"))?;
    serde_json::from_str(json).context("parse nutrient estimate")
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn nutrition_from_text(&self, food_name: &str) -> anyhow::Result<NutrientEstimate> {
        let prompt = format!(
            "Provide detailed nutritional information for \"{food_name}\". \
             Use standard nutritional databases for accuracy.\n{}",
            nutrition_schema_prompt()
        );
        let reply = self.generate(vec![Part::Text { text: prompt }]).await?;
        parse_estimate(&reply)
    }

    async fn nutrition_from_image(
        &self,
        image: Bytes,
        mime_type: &str,
    ) -> anyhow::Result<NutrientEstimate> {
        let prompt = format!(
            "Analyze this food image and provide nutritional information. \
             Be precise with nutritional values; if uncertain, make reasonable \
             estimates based on typical values for that food.\n{}",
            nutrition_schema_prompt()
        );
        let reply = self
            .generate(vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: general_purpose::STANDARD.encode(&image),
                    },
                },
                Part::Text { text: prompt },
            ])
            .await?;
        parse_estimate(&reply)
    }

    async fn meal_suggestions(
        &self,
        ingredients: &[String],
    ) -> anyhow::Result<Vec<MealSuggestion>> {
        let ingredient_list = ingredients.join(", ");
        let prompt = format!(
            r#"Based ONLY on these available ingredients: {ingredient_list}

Suggest up to 3 healthy and simple meal ideas (breakfast, lunch, or dinner) that primarily use these ingredients. Be creative but realistic. Common pantry staples (oil, salt, pepper, basic spices) may be assumed but not listed.

Return ONLY a valid JSON array with this exact structure (no markdown formatting, no extra text):
[
  {{
    "mealName": "Name of the meal",
    "description": "Brief description (1-2 sentences)",
    "primaryIngredients": ["ingredient1 from list", "ingredient2 from list"],
    "estimatedPrepTime": "e.g., 15 mins",
    "type": "Breakfast | Lunch | Dinner | Snack"
  }}
]

If not enough ingredients are available for full meals, suggest simple combinations. If the list is empty or nonsensical, return an empty array."#
        );
        let reply = self.generate(vec![Part::Text { text: prompt }]).await?;
        let json = match extract_json_array(&reply) {
            Some(j) => j,
            None => {
                warn!("no JSON array in meal suggestion reply");
                return Ok(Vec::new());
            }
        };
        serde_json::from_str(json).context("parse meal suggestions")
    }

    async fn health_advice(
        &self,
        food: &Food,
        allergies: &[String],
        conditions: &[String],
    ) -> anyhow::Result<HealthAdvice> {
        let prompt = format!(
            r#"Analyze the suitability of the following food for a specific user.

Food: {name} ({category})
Calories per 100g: {calories}
Protein: {protein}g, Carbs: {carbs}g, Sugar: {sugar}g, Fats: {fats}g, Sodium: {sodium}mg, Fiber: {fiber}g
Listed allergens: {food_allergens}

User allergies: {allergies}
User health conditions: {conditions}

Prioritize allergies: if any listed food allergen matches a user allergy, suitability MUST be "bad". Flag high sugar for diabetes, high sodium for hypertension, high fats for high cholesterol. Otherwise "good" if generally nutritious, "neutral" if okay in moderation.

Return ONLY a valid JSON object (no markdown formatting, no extra text):
{{
  "suitability": "good" | "bad" | "neutral",
  "reason": "Brief user-friendly explanation (1-2 sentences)"
}}"#,
            name = food.name,
            category = food.category,
            calories = food.calories_per_100g,
            protein = food.protein_g,
            carbs = food.carbs_g,
            sugar = food.sugar_g,
            fats = food.fats_g,
            sodium = food.sodium_mg,
            fiber = food.fiber_g,
            food_allergens = if food.allergens.is_empty() {
                "none".to_string()
            } else {
                food.allergens.join(", ")
            },
            allergies = if allergies.is_empty() {
                "none specified".to_string()
            } else {
                allergies.join(", ")
            },
            conditions = if conditions.is_empty() {
                "none specified".to_string()
            } else {
                conditions.join(", ")
            },
        );

        let reply = self.generate(vec![Part::Text { text: prompt }]).await?;
        let advice: Option<HealthAdvice> = extract_json_object(&reply)
            .and_then(|json| serde_json::from_str(json).ok());

        // An off-script reply degrades to neutral rather than failing the scan.
        Ok(match advice {
            Some(a) if ["good", "bad", "neutral"].contains(&a.suitability.as_str()) => a,
            _ => {
                warn!("unparsable health advice reply");
                HealthAdvice::neutral("Could not automatically determine suitability.")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_json_object() {
        let text = r#"{"foodName":"Apple","caloriesPer100g":52}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn extracts_fenced_json_object() {
        let text = "```json\n{\"foodName\":\"Apple\",\"caloriesPer100g\":52}\n```";
        let est = parse_estimate(text).unwrap();
        assert_eq!(est.food_name, "Apple");
        assert_eq!(est.calories_per_100g, 52.0);
    }

    #[test]
    fn rejects_reply_without_json() {
        assert!(parse_estimate("I couldn't help with that.").is_err());
        assert!(extract_json_array("no array here").is_none());
    }

    #[test]
    fn extracts_array_from_prose() {
        let text = "Here you go:\n[{\"mealName\":\"Salad\"}]\nEnjoy!";
        let json = extract_json_array(text).unwrap();
        let parsed: Vec<MealSuggestion> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].meal_name, "Salad");
    }
}
