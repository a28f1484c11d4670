use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use crate::api::models::{ CocktailError, SavedCocktail };

/// Per-user document collection of saved cocktails.
#[async_trait]
pub trait CocktailStore: Send + Sync {
    /// Stores `saved` unless the collection already holds the same drink.
    /// Returns false when it was skipped.
    async fn insert_new(&self, user_id: &str, saved: &SavedCocktail) -> Result<bool, CocktailError>;

    async fn list(&self, user_id: &str) -> Result<Vec<SavedCocktail>, CocktailError>;

    async fn set_favorite(&self, user_id: &str, id: &str, is_favorite: bool) -> Result<(), CocktailError>;

    /// Sets the flag on every listed document, or on none if any is missing.
    async fn set_favorites(&self, user_id: &str, ids: &[String], is_favorite: bool) -> Result<(), CocktailError>;

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), CocktailError>;
}

/// Keeps each user's collection in `<directory>/<user id>.json`.
pub struct FileCocktailStore {
    directory: Box<Path>,
    write_lock: Mutex<()>
}

type Documents = BTreeMap<String, SavedCocktail>;

impl FileCocktailStore {
    pub fn new(directory: Box<Path>) -> FileCocktailStore {
        FileCocktailStore { directory, write_lock: Mutex::new(()) }
    }

    fn collection_path(&self, user_id: &str) -> Result<PathBuf, CocktailError> {
        let is_safe = !user_id.is_empty()
            && user_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !user_id.starts_with('.');
        if !is_safe {
            return Err(CocktailError::InvalidRequest(format!("Invalid user id \"{}\"", user_id)));
        }
        Ok(self.directory.join(format!("{}.json", user_id)))
    }

    async fn read_documents(&self, path: &Path) -> Result<Documents, CocktailError> {
        match fs::read_to_string(path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Documents::new()),
            Err(error) => {
                log::warn!("Couldn't read {}: {}", path.display(), error);
                Err(CocktailError::NoDataReceived)
            }
        }
    }

    /// Writes next to the collection and renames over it, so readers see
    /// either the old file or the new one.
    async fn write_documents(&self, path: &Path, documents: &Documents) -> Result<(), String> {
        let json = serde_json::to_string(documents).map_err(|error| error.to_string())?;
        fs::create_dir_all(&self.directory).await.map_err(|error| error.to_string())?;
        let staging_path = path.with_extension("json.tmp");
        fs::write(&staging_path, json.as_bytes()).await.map_err(|error| error.to_string())?;
        fs::rename(&staging_path, path).await.map_err(|error| error.to_string())
    }

    /// Read-modify-write of one collection under the write lock.
    async fn update<T, F>(&self, user_id: &str, apply: F) -> Result<T, String>
    where
        F: FnOnce(&mut Documents) -> Result<T, String> + Send
    {
        let path = self.collection_path(user_id).map_err(|error| error.to_string())?;
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read_documents(&path).await.map_err(|error| error.to_string())?;
        let applied = apply(&mut documents)?;
        self.write_documents(&path, &documents).await?;
        Ok(applied)
    }
}

#[async_trait]
impl CocktailStore for FileCocktailStore {
    async fn insert_new(&self, user_id: &str, saved: &SavedCocktail) -> Result<bool, CocktailError> {
        let saved = saved.clone();
        self.update(user_id, move |documents| {
            if documents.values().any(|existing| existing.is_same_drink(&saved.cocktail)) {
                return Ok(false);
            }
            documents.insert(saved.id.clone(), saved);
            Ok(true)
        }).await.map_err(CocktailError::SaveFailure)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<SavedCocktail>, CocktailError> {
        let path = self.collection_path(user_id)?;
        Ok(self.read_documents(&path).await?.into_values().collect())
    }

    async fn set_favorite(&self, user_id: &str, id: &str, is_favorite: bool) -> Result<(), CocktailError> {
        self.update(user_id, |documents| {
            let saved = documents.get_mut(id).ok_or_else(|| format!("No saved cocktail \"{}\"", id))?;
            saved.is_favorite = is_favorite;
            Ok(())
        }).await.map_err(CocktailError::SaveFailure)
    }

    async fn set_favorites(&self, user_id: &str, ids: &[String], is_favorite: bool) -> Result<(), CocktailError> {
        self.update(user_id, |documents| {
            if let Some(missing) = ids.iter().find(|id| !documents.contains_key(id.as_str())) {
                return Err(format!("No saved cocktail \"{}\"", missing));
            }
            for id in ids {
                if let Some(saved) = documents.get_mut(id) {
                    saved.is_favorite = is_favorite;
                }
            }
            Ok(())
        }).await.map_err(CocktailError::SaveFailure)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), CocktailError> {
        self.update(user_id, |documents| {
            documents.remove(id).map(|_| ()).ok_or_else(|| format!("No saved cocktail \"{}\"", id))
        }).await.map_err(CocktailError::DeleteFailure)
    }
}
