use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{ watch, Mutex };
use crate::api::CocktailStore;
use crate::api::models::{ Cocktail, CocktailError, SavedCocktail, SavedCocktailFilter };

/// Saved cocktails of signed-in users. Every change reloads the user's full
/// list from the store and pushes it to that user's subscribers.
pub struct SavedCocktailService {
    store: Arc<dyn CocktailStore>,
    listeners: Mutex<HashMap<String, watch::Sender<Vec<SavedCocktail>>>>
}

impl SavedCocktailService {
    pub fn new(store: Arc<dyn CocktailStore>) -> SavedCocktailService {
        SavedCocktailService { store, listeners: Mutex::new(HashMap::new()) }
    }

    /// Newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<SavedCocktail>, CocktailError> {
        let mut saved_cocktails = self.store.list(user_id).await?;
        saved_cocktails.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(saved_cocktails)
    }

    /// Favorites only, drinks with a given spirit, or both. Newest first.
    pub async fn find(&self, user_id: &str, filter: &SavedCocktailFilter) -> Result<Vec<SavedCocktail>, CocktailError> {
        let mut saved_cocktails = self.list(user_id).await?;
        saved_cocktails.retain(|saved| filter.matches(saved));
        Ok(saved_cocktails)
    }

    /// Saves a cocktail unless one with the same name is already saved, in
    /// which case `None` is returned and nothing is written.
    pub async fn save(&self, user_id: &str, cocktail: Cocktail) -> Result<Option<SavedCocktail>, CocktailError> {
        let saved = SavedCocktail::new(cocktail);
        if !self.store.insert_new(user_id, &saved).await? {
            log::debug!("\"{}\" is already saved, skipping", saved.cocktail.name);
            return Ok(None);
        }
        log::info!("Saved \"{}\" as {}", saved.cocktail.name, saved.id);
        self.notify(user_id).await;
        Ok(Some(saved))
    }

    pub async fn toggle_favorite(&self, user_id: &str, id: &str) -> Result<SavedCocktail, CocktailError> {
        let mut saved = self.list(user_id).await
            .map_err(|error| CocktailError::SaveFailure(error.to_string()))?
            .into_iter()
            .find(|saved| saved.id == id)
            .ok_or_else(|| CocktailError::SaveFailure(format!("No saved cocktail \"{}\"", id)))?;
        saved.is_favorite = !saved.is_favorite;
        self.store.set_favorite(user_id, id, saved.is_favorite).await?;
        self.notify(user_id).await;
        Ok(saved)
    }

    /// Sets the favorite flag on several saved cocktails in one write.
    pub async fn set_favorites(&self, user_id: &str, ids: &[String], is_favorite: bool) -> Result<(), CocktailError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.store.set_favorites(user_id, ids, is_favorite).await?;
        log::info!("Set favorite = {} on {} saved cocktails", is_favorite, ids.len());
        self.notify(user_id).await;
        Ok(())
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<(), CocktailError> {
        self.store.delete(user_id, id).await?;
        log::info!("Deleted saved cocktail {}", id);
        self.notify(user_id).await;
        Ok(())
    }

    /// Live view of a user's list. One channel per user, shared by all
    /// subscribers.
    pub async fn subscribe(&self, user_id: &str) -> Result<watch::Receiver<Vec<SavedCocktail>>, CocktailError> {
        let mut listeners = self.listeners.lock().await;
        if let Some(sender) = listeners.get(user_id) {
            return Ok(sender.subscribe());
        }
        let (sender, receiver) = watch::channel(self.list(user_id).await?);
        listeners.insert(user_id.to_string(), sender);
        Ok(receiver)
    }

    async fn notify(&self, user_id: &str) {
        let listeners = self.listeners.lock().await;
        let Some(sender) = listeners.get(user_id) else {
            return;
        };
        match self.list(user_id).await {
            Ok(saved_cocktails) => {
                log::debug!("Pushing {} saved cocktails to listeners of {}", saved_cocktails.len(), user_id);
                sender.send_replace(saved_cocktails);
            },
            Err(error) => log::warn!("Couldn't refresh saved cocktails of {}: {}", user_id, error)
        }
    }
}
