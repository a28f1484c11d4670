use std::collections::{ HashMap, HashSet };
use serde_json::json;
use tokio::sync::{ watch, Mutex };
use crate::api::{ ingredients, CandidateSupplier, ResourceService };
use crate::api::models::{ Cocktail, CocktailError, SelectionSnapshot, Spirit };

/// Result of one `fetch_cocktail` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A verified cocktail was published under this name.
    Published(String),
    /// Nothing new is left for the spirit until the session is reset.
    Exhausted,
    Failed(CocktailError),
    /// Another fetch was already running; nothing happened.
    Busy,
    /// The session was reset while this fetch was running; its result was dropped.
    Stale
}

/// Shuffled unconsumed candidates for one spirit.
struct SessionPool {
    candidates: Vec<Cocktail>,
    cursor: usize
}

impl SessionPool {
    fn new(candidates: Vec<Cocktail>) -> Self {
        SessionPool { candidates, cursor: 0 }
    }

    fn next(&mut self) -> Option<Cocktail> {
        let candidate = self.candidates.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(candidate)
    }
}

#[derive(Default)]
struct SelectionState {
    snapshot: SelectionSnapshot,
    shown: HashSet<String>,
    pools: HashMap<Spirit, SessionPool>,
    exhausted: HashSet<Spirit>,
    // Bumped by a reset that lands while a fetch is running.
    generation: u64
}

enum NextCandidate {
    Candidate(Cocktail),
    Refill,
    Exhausted
}

pub struct SelectionService {
    supplier: CandidateSupplier,
    resource_service: ResourceService,
    state: Mutex<SelectionState>,
    publisher: watch::Sender<SelectionSnapshot>
}

impl SelectionService {
    pub fn new(supplier: CandidateSupplier, resource_service: ResourceService) -> SelectionService {
        let (publisher, _) = watch::channel(SelectionSnapshot::default());
        SelectionService {
            supplier,
            resource_service,
            state: Mutex::new(SelectionState::default()),
            publisher
        }
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.publisher.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectionSnapshot> {
        self.publisher.subscribe()
    }

    pub async fn fetch_cocktail(&self, spirit: Spirit) -> FetchOutcome {
        let generation = {
            let mut state = self.state.lock().await;
            if state.snapshot.is_loading {
                log::debug!("Ignoring {} request, a fetch is already running", spirit);
                return FetchOutcome::Busy;
            }
            state.snapshot.is_loading = true;
            state.snapshot.error_message = None;
            self.publish(&state);
            state.generation
        };

        let selection = self.select(spirit, generation).await;

        let mut state = self.state.lock().await;
        state.snapshot.is_loading = false;
        if state.generation != generation {
            log::debug!("Dropping stale {} result after a reset", spirit);
            self.publish(&state);
            return FetchOutcome::Stale;
        }
        let outcome = match selection {
            Ok(Some(cocktail)) => {
                let message = self.resource_service.render_log_message(
                    "publishing_cocktail_info_message_template",
                    &json!({ "name": cocktail.name, "spirit": spirit.name() })
                );
                log::info!("{}", message);
                state.shown.insert(cocktail.name.clone());
                state.snapshot.current_drink = cocktail.name.clone();
                state.snapshot.current_ingredients = ingredients::format_ingredients(&cocktail);
                state.snapshot.current_cocktail = Some(cocktail.clone());
                FetchOutcome::Published(cocktail.name)
            },
            Ok(None) => FetchOutcome::Stale,
            Err(error @ CocktailError::PoolExhausted(_)) => {
                log::info!("{}", error);
                state.exhausted.insert(spirit);
                state.pools.remove(&spirit);
                state.snapshot.no_more_cocktails = true;
                state.snapshot.error_message = Some(self.resource_service.render_error_message(&error));
                FetchOutcome::Exhausted
            },
            Err(error) => {
                log::warn!("Fetching a {} cocktail failed: {}", spirit, error);
                state.snapshot.error_message = Some(self.resource_service.render_error_message(&error));
                FetchOutcome::Failed(error)
            }
        };
        self.publish(&state);
        outcome
    }

    /// Clears the session. A fetch still running keeps the loading flag and
    /// throws its result away when it lands.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        if state.snapshot.is_loading {
            state.generation += 1;
        }
        state.shown.clear();
        state.pools.clear();
        state.exhausted.clear();
        state.snapshot = SelectionSnapshot {
            is_loading: state.snapshot.is_loading,
            ..SelectionSnapshot::default()
        };
        log::info!("Selection session reset");
        self.publish(&state);
    }

    /// Walks the pool until a candidate passes verification. The pool is
    /// refilled from the backend at most once per call, which bounds the loop
    /// by the remaining pool plus one refilled pool. `Ok(None)` means a reset
    /// superseded this call.
    async fn select(&self, spirit: Spirit, generation: u64) -> Result<Option<Cocktail>, CocktailError> {
        let mut refilled = false;
        loop {
            let next = {
                let mut guard = self.state.lock().await;
                let state = &mut *guard;
                if state.generation != generation {
                    return Ok(None);
                }
                let mut next = None;
                if let Some(pool) = state.pools.get_mut(&spirit) {
                    // Skip drinks shown through another spirit since this pool was built.
                    while let Some(candidate) = pool.next() {
                        if !state.shown.contains(&candidate.name) {
                            next = Some(candidate);
                            break;
                        }
                    }
                }
                match next {
                    Some(candidate) => NextCandidate::Candidate(candidate),
                    None if refilled || state.exhausted.contains(&spirit) => NextCandidate::Exhausted,
                    None => NextCandidate::Refill
                }
            };

            let candidate = match next {
                NextCandidate::Candidate(candidate) => candidate,
                NextCandidate::Exhausted => return Err(CocktailError::PoolExhausted(spirit.name().to_string())),
                NextCandidate::Refill => {
                    refilled = true;
                    let message = self.resource_service.render_log_message(
                        "refilling_pool_info_message_template",
                        &json!({ "spirit": spirit.name(), "terms": spirit.query_terms().join(", ") })
                    );
                    log::info!("{}", message);
                    // Only a reset touches the shown set while this call runs,
                    // and the generation check below catches that.
                    let shown = self.state.lock().await.shown.clone();
                    let pool = self.supplier.request_pool(spirit, &shown).await?;
                    let mut state = self.state.lock().await;
                    if state.generation != generation {
                        return Ok(None);
                    }
                    log::debug!("New {} pool holds {} candidates", spirit, pool.len());
                    state.pools.insert(spirit, SessionPool::new(pool));
                    continue;
                }
            };

            match self.resolve_details(&candidate.name).await? {
                Some(cocktail) if ingredients::contains_spirit(&cocktail, spirit) => return Ok(Some(cocktail)),
                Some(cocktail) => log::debug!("\"{}\" doesn't list any {}, trying the next one", cocktail.name, spirit),
                None => log::debug!("No recipe found for \"{}\", trying the next one", candidate.name)
            }
        }
    }

    /// Full record for a candidate. The backend searches by substring, so an
    /// exact name match wins over the first hit.
    async fn resolve_details(&self, name: &str) -> Result<Option<Cocktail>, CocktailError> {
        let mut matches = self.supplier.recipe_source().search_by_name(name).await?;
        if matches.is_empty() {
            return Ok(None);
        }
        let position = matches.iter().position(|cocktail| cocktail.name == name).unwrap_or(0);
        Ok(Some(matches.swap_remove(position)))
    }

    fn publish(&self, state: &SelectionState) {
        self.publisher.send_replace(state.snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use crate::api::RecipeSource;
    use crate::api::candidate_supplier::tests::FakeRecipeSource;
    use super::*;

    const RESOURCES: &str = r#"<resources><string name="no_more_cocktails_error_message_template">No more cocktails available for {{spirit}}</string><string name="no_data_received_error_message">No data received</string></resources>"#;

    fn selection_service(recipe_source: Arc<dyn RecipeSource>) -> SelectionService {
        SelectionService::new(
            CandidateSupplier::new(recipe_source),
            ResourceService::from_xml_str(RESOURCES).unwrap()
        )
    }

    fn gin_bar() -> FakeRecipeSource {
        FakeRecipeSource::default()
            .with_filter("Gin", &["Gimlet", "Negroni", "Martini"])
            .with_detail("Gimlet", &["Gin", "Lime juice"])
            .with_detail("Negroni", &["Gin", "Campari", "Sweet Vermouth"])
            .with_detail("Martini", &["Gin", "Dry Vermouth", "Olive"])
    }

    /// Holds every filter query until released.
    struct GatedRecipeSource {
        inner: FakeRecipeSource,
        entered: Notify,
        release: Notify
    }

    #[async_trait]
    impl RecipeSource for GatedRecipeSource {
        async fn filter_by_ingredient(&self, term: &str) -> Result<Vec<Cocktail>, CocktailError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.filter_by_ingredient(term).await
        }

        async fn search_by_name(&self, name: &str) -> Result<Vec<Cocktail>, CocktailError> {
            self.inner.search_by_name(name).await
        }
    }

    #[tokio::test]
    async fn publishes_verified_cocktail() {
        let recipe_source = Arc::new(FakeRecipeSource::default()
            .with_filter("Gin", &["Gimlet"])
            .with_detail("Gimlet", &["Gin", "Lime juice"]));
        let service = selection_service(recipe_source);

        let outcome = service.fetch_cocktail(Spirit::Gin).await;

        assert_eq!(outcome, FetchOutcome::Published("Gimlet".to_string()));
        let snapshot = service.snapshot();
        assert_eq!(snapshot.current_drink, "Gimlet");
        assert_eq!(snapshot.current_ingredients, "Gin, Lime juice");
        assert!(!snapshot.is_loading);
        assert!(snapshot.error_message.is_none());
    }

    #[tokio::test]
    async fn pages_through_pool_without_repeats_then_exhausts() {
        let recipe_source = Arc::new(gin_bar());
        let service = selection_service(recipe_source.clone());

        let mut published = HashSet::new();
        for _ in 0..3 {
            match service.fetch_cocktail(Spirit::Gin).await {
                FetchOutcome::Published(name) => assert!(published.insert(name)),
                other => panic!("unexpected outcome {:?}", other)
            }
        }
        assert_eq!(recipe_source.filter_call_count(), 1);

        assert_eq!(service.fetch_cocktail(Spirit::Gin).await, FetchOutcome::Exhausted);
        let snapshot = service.snapshot();
        assert!(snapshot.no_more_cocktails);
        assert_eq!(snapshot.error_message.as_deref(), Some("No more cocktails available for Gin"));
        assert!(published.contains(&snapshot.current_drink));
    }

    #[tokio::test]
    async fn exhaustion_is_terminal_until_reset() {
        let recipe_source = Arc::new(FakeRecipeSource::default()
            .with_filter("Vodka", &["Screwdriver"])
            .with_detail("Screwdriver", &["Vodka", "Orange juice"]));
        let service = selection_service(recipe_source.clone());

        assert_eq!(service.fetch_cocktail(Spirit::Vodka).await, FetchOutcome::Published("Screwdriver".to_string()));
        assert_eq!(service.fetch_cocktail(Spirit::Vodka).await, FetchOutcome::Exhausted);
        assert_eq!(recipe_source.filter_call_count(), 2);
        assert_eq!(service.fetch_cocktail(Spirit::Vodka).await, FetchOutcome::Exhausted);
        assert_eq!(recipe_source.filter_call_count(), 2);

        service.reset().await;
        assert_eq!(service.fetch_cocktail(Spirit::Vodka).await, FetchOutcome::Published("Screwdriver".to_string()));
    }

    #[tokio::test]
    async fn skips_candidates_failing_verification() {
        let recipe_source = Arc::new(FakeRecipeSource::default()
            .with_filter("Scotch", &["Godfather", "Rob Roy"])
            .with_filter("Whiskey", &[])
            .with_filter("Bourbon", &[])
            .with_filter("Rye", &[])
            .with_detail("Godfather", &["Amaretto", "Ice"])
            .with_detail("Rob Roy", &["Scotch", "Sweet Vermouth"]));
        let service = selection_service(recipe_source.clone());

        assert_eq!(service.fetch_cocktail(Spirit::Whisky).await, FetchOutcome::Published("Rob Roy".to_string()));
        // The rejected drink was not marked shown, so it comes back and fails again.
        assert_eq!(service.fetch_cocktail(Spirit::Whisky).await, FetchOutcome::Exhausted);
        // Godfather is looked up on both calls, Rob Roy once.
        assert_eq!(recipe_source.search_call_count(), 3);
        assert_eq!(service.snapshot().current_drink, "Rob Roy");
    }

    #[tokio::test]
    async fn skips_candidates_without_detail_record() {
        let recipe_source = Arc::new(FakeRecipeSource::default()
            .with_filter("Tequila", &["Ghost", "Margarita"])
            .with_detail("Margarita", &["Tequila", "Triple sec", "Lime juice"]));
        let service = selection_service(recipe_source);

        assert_eq!(service.fetch_cocktail(Spirit::Tequila).await, FetchOutcome::Published("Margarita".to_string()));
    }

    #[tokio::test]
    async fn network_failure_is_terminal_for_the_call() {
        let recipe_source = Arc::new(FakeRecipeSource::default());
        let service = selection_service(recipe_source.clone());

        assert_eq!(service.fetch_cocktail(Spirit::Rum).await, FetchOutcome::Failed(CocktailError::NoDataReceived));
        let snapshot = service.snapshot();
        assert_eq!(snapshot.error_message.as_deref(), Some("No data received"));
        assert!(!snapshot.is_loading);
        assert!(!snapshot.no_more_cocktails);
        assert_eq!(recipe_source.filter_call_count(), 1);
    }

    #[tokio::test]
    async fn reset_is_idempotent_and_forgets_shown_drinks() {
        let recipe_source = Arc::new(FakeRecipeSource::default()
            .with_filter("Gin", &["Gimlet"])
            .with_detail("Gimlet", &["Gin", "Lime juice"]));
        let service = selection_service(recipe_source);
        service.fetch_cocktail(Spirit::Gin).await;
        service.fetch_cocktail(Spirit::Gin).await;

        service.reset().await;
        let once = service.snapshot();
        service.reset().await;
        assert_eq!(service.snapshot(), once);
        assert_eq!(once, SelectionSnapshot::default());

        assert_eq!(service.fetch_cocktail(Spirit::Gin).await, FetchOutcome::Published("Gimlet".to_string()));
    }

    #[tokio::test]
    async fn rejects_fetch_while_one_is_running() {
        let recipe_source = Arc::new(GatedRecipeSource {
            inner: gin_bar(),
            entered: Notify::new(),
            release: Notify::new()
        });
        let service = Arc::new(selection_service(recipe_source.clone()));
        let running = tokio::spawn({
            let service = service.clone();
            async move { service.fetch_cocktail(Spirit::Gin).await }
        });
        recipe_source.entered.notified().await;

        let before = service.snapshot();
        assert!(before.is_loading);
        assert_eq!(service.fetch_cocktail(Spirit::Vodka).await, FetchOutcome::Busy);
        assert_eq!(service.snapshot(), before);

        recipe_source.release.notify_one();
        assert!(matches!(running.await.unwrap(), FetchOutcome::Published(_)));
        assert_eq!(recipe_source.inner.filter_call_count(), 1);
    }

    #[tokio::test]
    async fn drops_result_that_lands_after_reset() {
        let recipe_source = Arc::new(GatedRecipeSource {
            inner: gin_bar(),
            entered: Notify::new(),
            release: Notify::new()
        });
        let service = Arc::new(selection_service(recipe_source.clone()));
        let running = tokio::spawn({
            let service = service.clone();
            async move { service.fetch_cocktail(Spirit::Gin).await }
        });
        recipe_source.entered.notified().await;

        service.reset().await;
        recipe_source.release.notify_one();

        assert_eq!(running.await.unwrap(), FetchOutcome::Stale);
        let snapshot = service.snapshot();
        assert_eq!(snapshot, SelectionSnapshot::default());

        // The stale pool was never installed, so the next fetch queries again.
        let next = tokio::spawn({
            let service = service.clone();
            async move { service.fetch_cocktail(Spirit::Gin).await }
        });
        recipe_source.entered.notified().await;
        recipe_source.release.notify_one();
        assert!(matches!(next.await.unwrap(), FetchOutcome::Published(_)));
        assert_eq!(recipe_source.inner.filter_call_count(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_result() {
        let recipe_source = Arc::new(FakeRecipeSource::default()
            .with_filter("Gin", &["Gimlet"])
            .with_detail("Gimlet", &["Gin", "Lime juice"]));
        let service = selection_service(recipe_source);
        let mut receiver = service.subscribe();

        service.fetch_cocktail(Spirit::Gin).await;

        assert!(receiver.has_changed().unwrap());
        let seen = receiver.borrow_and_update().clone();
        assert_eq!(seen.current_drink, "Gimlet");
        assert!(!seen.is_loading);
    }
}
