//! Nutrition query normalizer.
//!
//! Turns a free-text ingredient query ("75g Butter") into a fixed-shape
//! nutrient summary by parsing the measurement, resolving it to grams,
//! looking the food up in the USDA FoodData Central API, and scaling the
//! per-100g nutrient data to the requested quantity.
//!
//! "No data" outcomes (unparseable input, unknown food, empty nutrient
//! list) are soft failures and come back as [`NutrientSummary::ZERO`].
//! Configuration and transport faults are hard failures and come back as
//! [`NutritionError`] so callers can tell a misconfigured integration apart
//! from an ingredient with no data.

use serde::Serialize;
use thiserror::Error;

mod client;
mod parse;

pub use client::NutritionClient;
pub use parse::{ParsedQuantity, grams_per_unit, parse_query};

/// USDA nutrient ids for the four tracked nutrients.
pub const ENERGY_KCAL: u64 = 1008;
pub const TOTAL_FAT: u64 = 1004;
pub const PROTEIN: u64 = 1003;
pub const CARBOHYDRATES: u64 = 1005;

/// The only success shape: all four fields always present, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientSummary {
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub total_fat: f64,
}

impl NutrientSummary {
    /// The soft-failure value: a well-formed summary with no data.
    pub const ZERO: Self = Self {
        calories: 0.0,
        carbohydrates: 0.0,
        protein: 0.0,
        total_fat: 0.0,
    };
}

/// A transient transport or HTTP outcome from one call site, kept separate
/// from [`NutritionError`] so retry classification stays in one place.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http status {0}")]
    Status(reqwest::StatusCode),

    #[error("retries exhausted after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

/// Hard failures. Each variant names the query or food id involved and the
/// cause class; soft "no data" outcomes never appear here.
#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("USDA_FOOD_API_KEY is not configured")]
    MissingApiKey,

    #[error("food search request failed for '{food}': {cause}")]
    Search { food: String, cause: FetchError },

    #[error("food details request failed for food id {id}: {cause}")]
    Detail { id: u64, cause: FetchError },

    #[error("failed to decode search response for '{food}': {source}")]
    DecodeSearch {
        food: String,
        source: reqwest::Error,
    },

    #[error("failed to decode details response for food id {id}: {source}")]
    DecodeDetail { id: u64, source: reqwest::Error },
}
