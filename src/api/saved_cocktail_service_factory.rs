use std::sync::Arc;
use crate::api::{ FileCocktailStore, SavedCocktailService };

pub struct SavedCocktailServiceFactory {}

impl SavedCocktailServiceFactory {
    pub fn create() -> Result<SavedCocktailService, String> {
        let home_dir = dirs::home_dir().ok_or("Couldn't locate home directory")?;
        let saved_cocktails_dir_path = dotenv::var("SAVED_COCKTAILS_DIR_PATH")
            .map_err(|error| format!("SAVED_COCKTAILS_DIR_PATH: {}", error))?;
        let directory = home_dir.join(saved_cocktails_dir_path);
        log::info!("Keeping saved cocktails in \"{}\"", directory.display());
        let store = FileCocktailStore::new(directory.into_boxed_path());
        Ok(SavedCocktailService::new(Arc::new(store)))
    }
}
