use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use crate::api::models::{ Cocktail, CocktailError, CocktailResponse };

pub const DEFAULT_RECIPE_API_BASE_URL: &str = "https://www.thecocktaildb.com/api/json/v1/1";
pub const DEFAULT_RECIPE_API_TIMEOUT_MS: u64 = 10_000;

/// Read-only access to the recipe backend. An empty vector means the backend
/// had no matches; errors are already mapped into `CocktailError`.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Summaries of every drink listing `term` as an ingredient.
    async fn filter_by_ingredient(&self, term: &str) -> Result<Vec<Cocktail>, CocktailError>;

    /// Full records whose name matches `name`.
    async fn search_by_name(&self, name: &str) -> Result<Vec<Cocktail>, CocktailError>;
}

pub struct RecipeService {
    client: Client,
    base_url: String
}

impl RecipeService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<RecipeService, CocktailError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CocktailError::from)?;
        Ok(RecipeService {
            client,
            base_url: base_url.trim_end_matches('/').to_string()
        })
    }

    async fn get_drinks(&self, endpoint: &str, key: &str, value: &str) -> Result<Vec<Cocktail>, CocktailError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.client
            .get(&url)
            .query(&[(key, value)])
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(CocktailError::NoDataReceived);
        }
        let decoded: CocktailResponse = serde_json::from_slice(&body)?;
        Ok(decoded.drinks.unwrap_or_default())
    }
}

#[async_trait]
impl RecipeSource for RecipeService {
    async fn filter_by_ingredient(&self, term: &str) -> Result<Vec<Cocktail>, CocktailError> {
        log::debug!("Filtering recipes by ingredient \"{}\"", term);
        self.get_drinks("filter.php", "i", term).await
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<Cocktail>, CocktailError> {
        log::debug!("Searching recipes by name \"{}\"", name);
        self.get_drinks("search.php", "s", name).await
    }
}
