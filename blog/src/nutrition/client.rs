use super::parse::parse_query;
use super::{
    CARBOHYDRATES, ENERGY_KCAL, FetchError, NutrientSummary, NutritionError, PROTEIN, TOTAL_FAT,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc";

const RETRYABLE_STATUS: [StatusCode; 4] = [
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Client for the USDA FoodData Central API. Stateless between lookups;
/// concurrent callers can share one instance.
pub struct NutritionClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl NutritionClient {
    /// The credential is injected here rather than read from the
    /// environment per call; `None` makes every lookup a hard failure.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Normalizes one ingredient query into a [`NutrientSummary`].
    ///
    /// Soft failures (empty input, unparseable measurement, unknown food,
    /// no nutrient data) return [`NutrientSummary::ZERO`]; configuration
    /// and transport faults return a [`NutritionError`].
    pub async fn get_nutrition_info(
        &self,
        query: &str,
    ) -> Result<NutrientSummary, NutritionError> {
        if query.trim().is_empty() {
            return Ok(NutrientSummary::ZERO);
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or(NutritionError::MissingApiKey)?;

        let Some(parsed) = parse_query(query) else {
            return Ok(NutrientSummary::ZERO);
        };

        let total_grams = parsed.total_grams();
        if total_grams <= 0.0 {
            return Ok(NutrientSummary::ZERO);
        }

        let Some(food) = self.search_food(api_key, &parsed.food_name).await? else {
            return Ok(NutrientSummary::ZERO);
        };

        let detail = self.food_detail(api_key, food.fdc_id).await?;
        if detail.food_nutrients.is_empty() {
            return Ok(NutrientSummary::ZERO);
        }

        // nutrient amounts are defined per 100 grams
        Ok(project(&detail.food_nutrients, total_grams / 100.0))
    }

    /// First search hit for the food name, if any.
    async fn search_food(
        &self,
        api_key: &str,
        food: &str,
    ) -> Result<Option<FoodHit>, NutritionError> {
        let url = format!("{}/v1/foods/search", self.base_url);
        let params = [
            ("api_key", api_key),
            ("pageSize", "1"),
            ("pageNumber", "1"),
            ("query", food),
        ];

        let response = self
            .get_with_retry(&url, &params)
            .await
            .map_err(|cause| NutritionError::Search {
                food: food.to_string(),
                cause,
            })?;

        let search: SearchResponse =
            response
                .json()
                .await
                .map_err(|source| NutritionError::DecodeSearch {
                    food: food.to_string(),
                    source,
                })?;

        Ok(search.foods.into_iter().next())
    }

    async fn food_detail(&self, api_key: &str, id: u64) -> Result<FoodDetail, NutritionError> {
        let url = format!("{}/v1/food/{}", self.base_url, id);
        let params = [("api_key", api_key)];

        let response = self
            .get_with_retry(&url, &params)
            .await
            .map_err(|cause| NutritionError::Detail { id, cause })?;

        response
            .json()
            .await
            .map_err(|source| NutritionError::DecodeDetail { id, source })
    }

    /// Bounded retry for one call site. Only timeouts, connection failures,
    /// and 500/502/503/504 are retried; every other failure surfaces on the
    /// first attempt.
    async fn get_with_retry(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let error = match self
                .http
                .get(url)
                .timeout(self.timeout)
                .query(params)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if RETRYABLE_STATUS.contains(&response.status()) => {
                    FetchError::Status(response.status())
                }
                Ok(response) => return Err(FetchError::Status(response.status())),
                Err(error) if error.is_timeout() || error.is_connect() => {
                    FetchError::Transport(error)
                }
                Err(error) => return Err(FetchError::Transport(error)),
            };

            if attempt >= self.max_retries {
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            tracing::warn!(attempt, error = %error, "transient failure, retrying");
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

fn project(nutrients: &[FoodNutrient], scale: f64) -> NutrientSummary {
    let mut summary = NutrientSummary::ZERO;

    for entry in nutrients {
        let (Some(nutrient), Some(amount)) = (entry.nutrient.as_ref(), entry.amount) else {
            continue;
        };
        let scaled = amount * scale;
        match nutrient.id {
            ENERGY_KCAL => summary.calories = scaled,
            CARBOHYDRATES => summary.carbohydrates = scaled,
            PROTEIN => summary.protein = scaled,
            TOTAL_FAT => summary.total_fat = scaled,
            _ => {}
        }
    }

    summary
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FoodHit>,
}

#[derive(Deserialize)]
struct FoodHit {
    #[serde(rename = "fdcId")]
    fdc_id: u64,
}

#[derive(Deserialize)]
struct FoodDetail {
    #[serde(rename = "foodNutrients", default)]
    food_nutrients: Vec<FoodNutrient>,
}

#[derive(Deserialize)]
struct FoodNutrient {
    nutrient: Option<NutrientRef>,
    amount: Option<f64>,
}

#[derive(Deserialize)]
struct NutrientRef {
    id: u64,
}
