//! TheMealDB random-recipe client.
//!
//! Draws random meals until enough of them carry both a source link and a
//! thumbnail, and simplifies each one for the agents to consume.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

/// Draws against the attempt budget per requested recipe; the upstream API
/// returns one random meal per call and many meals lack a source link.
const ATTEMPTS_PER_RECIPE: u32 = 25;

#[derive(Debug, Error)]
pub enum MealDbError {
    #[error("recipe request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gave up after drawing {attempts} random meals: wanted {wanted} usable recipes, found {found}")]
    AttemptsExhausted {
        attempts: u32,
        wanted: usize,
        found: usize,
    },
}

/// A meal reduced to the fields the blog post needs. Serialized field names
/// follow the upstream API so the agents see familiar keys.
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strInstructions")]
    pub instructions: String,
    pub thumb: String,
    #[serde(rename = "strYoutube")]
    pub youtube: String,
    pub source: String,
    pub ingredients: Vec<String>,
}

pub struct MealDbClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl MealDbClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Collects `count` random recipes that have a non-empty source and
    /// thumbnail. Fetch errors and unusable meals are skipped, bounded by a
    /// total attempt budget so a broken API cannot spin forever.
    pub async fn random_recipes(&self, count: usize) -> Result<Vec<Recipe>, MealDbError> {
        let budget = count as u32 * ATTEMPTS_PER_RECIPE;
        let mut recipes = Vec::with_capacity(count);
        let mut attempts = 0;

        while recipes.len() < count {
            if attempts >= budget {
                return Err(MealDbError::AttemptsExhausted {
                    attempts,
                    wanted: count,
                    found: recipes.len(),
                });
            }
            attempts += 1;

            match self.random_recipe().await {
                Ok(Some(recipe)) => recipes.push(recipe),
                Ok(None) => {
                    tracing::debug!("random meal had no source or thumbnail, drawing again");
                }
                Err(error) => {
                    tracing::warn!(%error, "random meal fetch failed, drawing again");
                }
            }
        }

        Ok(recipes)
    }

    /// One draw; `None` when the meal lacks a source link or thumbnail.
    async fn random_recipe(&self) -> Result<Option<Recipe>, MealDbError> {
        let url = format!("{}/random.php", self.base_url);
        let body: Value = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(meal) = body
            .get("meals")
            .and_then(Value::as_array)
            .and_then(|meals| meals.first())
        else {
            return Ok(None);
        };

        let source = text(meal, "strSource");
        let thumb = text(meal, "strMealThumb");
        if source.trim().is_empty() || thumb.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Recipe {
            id: text(meal, "idMeal"),
            name: text(meal, "strMeal"),
            instructions: text(meal, "strInstructions").replace("\r\n", "<br>"),
            thumb,
            youtube: text(meal, "strYoutube"),
            source,
            ingredients: ingredients(meal),
        }))
    }
}

fn text(meal: &Value, key: &str) -> String {
    meal.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Joins `strMeasureN` and `strIngredientN` pairs, stopping at the first
/// empty ingredient slot (the API pads up to twenty).
fn ingredients(meal: &Value) -> Vec<String> {
    let mut out = Vec::new();
    for i in 1..=20 {
        let ingredient = text(meal, &format!("strIngredient{i}"));
        let ingredient = ingredient.trim();
        if ingredient.is_empty() {
            break;
        }
        let measure = text(meal, &format!("strMeasure{i}"));
        out.push(format!("{} {}", measure.trim(), ingredient).trim().to_string());
    }
    out
}
