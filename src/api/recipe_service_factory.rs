use std::time::Duration;
use crate::api::{ RecipeService, DEFAULT_RECIPE_API_BASE_URL, DEFAULT_RECIPE_API_TIMEOUT_MS };

pub struct RecipeServiceFactory {}

impl RecipeServiceFactory {
    pub fn create() -> Result<RecipeService, String> {
        let base_url = dotenv::var("RECIPE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_RECIPE_API_BASE_URL.to_string());
        let timeout_ms = match dotenv::var("RECIPE_API_TIMEOUT_MS") {
            Ok(value) => value.trim().parse::<u64>()
                .map_err(|error| format!("RECIPE_API_TIMEOUT_MS: {}", error))?,
            Err(_) => DEFAULT_RECIPE_API_TIMEOUT_MS
        };
        log::info!("Using recipe backend \"{}\" with a {}ms timeout", base_url, timeout_ms);
        RecipeService::new(&base_url, Duration::from_millis(timeout_ms))
            .map_err(|error| error.to_string())
    }
}
