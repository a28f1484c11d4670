use std::collections::HashSet;
use std::sync::Arc;
use futures_util::future::join_all;
use rand::seq::SliceRandom;
use crate::api::RecipeSource;
use crate::api::models::{ Cocktail, CocktailError, Spirit };

/// Builds candidate pools for a spirit from the recipe backend.
pub struct CandidateSupplier {
    recipe_source: Arc<dyn RecipeSource>
}

impl CandidateSupplier {
    pub fn new(recipe_source: Arc<dyn RecipeSource>) -> CandidateSupplier {
        CandidateSupplier { recipe_source }
    }

    pub fn recipe_source(&self) -> &dyn RecipeSource {
        self.recipe_source.as_ref()
    }

    /// Fresh shuffled pool of drinks not in `shown`.
    pub async fn request_pool(&self, spirit: Spirit, shown: &HashSet<String>) -> Result<Vec<Cocktail>, CocktailError> {
        let candidates = self.fetch_candidates(spirit).await?;
        Self::build_pool(spirit, candidates, shown)
    }

    /// Queries every term of the spirit concurrently and merges the results,
    /// deduplicated by name. A failed term contributes nothing; only when every
    /// term fails is the first error returned.
    async fn fetch_candidates(&self, spirit: Spirit) -> Result<Vec<Cocktail>, CocktailError> {
        let terms = spirit.query_terms();
        let queries = terms.iter().map(|term| self.recipe_source.filter_by_ingredient(term));
        let results = join_all(queries).await;

        let mut first_error = None;
        let mut succeeded = 0;
        let mut merged = Vec::new();
        for (term, result) in terms.iter().zip(results) {
            match result {
                Ok(drinks) => {
                    log::debug!("Query term \"{}\" returned {} drinks", term, drinks.len());
                    succeeded += 1;
                    merged.extend(drinks);
                },
                Err(error) => {
                    log::warn!("Query term \"{}\" for {} failed: {}", term, spirit, error);
                    first_error.get_or_insert(error);
                }
            }
        }
        if succeeded == 0 {
            if let Some(error) = first_error {
                return Err(error);
            }
        }

        let mut seen_names = HashSet::new();
        merged.retain(|cocktail| seen_names.insert(cocktail.name.clone()));
        Ok(merged)
    }

    /// Drops already shown drinks and shuffles what is left.
    fn build_pool(spirit: Spirit, mut candidates: Vec<Cocktail>, shown: &HashSet<String>) -> Result<Vec<Cocktail>, CocktailError> {
        if candidates.is_empty() {
            return Err(CocktailError::NoCandidatesFound);
        }
        candidates.retain(|cocktail| !shown.contains(&cocktail.name));
        if candidates.is_empty() {
            return Err(CocktailError::PoolExhausted(spirit.name().to_string()));
        }
        candidates.shuffle(&mut rand::thread_rng());
        Ok(candidates)
    }
}
