use chrono::{ DateTime, Utc };
use uuid::Uuid;
use serde::{ Deserialize, Serialize };
use crate::api::ingredients;
use crate::api::models::{ Cocktail, Spirit };

const MAIN_SPIRITS: [&str; 8] = ["gin", "vodka", "rum", "tequila", "whisky", "whiskey", "bourbon", "scotch"];

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SavedCocktail {
    pub id: String,
    #[serde(rename = "cocktailId")]
    pub cocktail_id: String,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
    pub cocktail: Cocktail
}

impl SavedCocktail {
    pub fn new(cocktail: Cocktail) -> Self {
        SavedCocktail {
            id: Uuid::new_v4().to_string(),
            cocktail_id: cocktail.name.clone(),
            saved_at: Utc::now(),
            is_favorite: false,
            cocktail
        }
    }

    pub fn formatted_ingredients(&self) -> Vec<String> {
        ingredients::format_ingredient_list(&self.cocktail)
    }

    /// First formatted ingredient naming a base spirit, if any.
    pub fn main_spirit(&self) -> Option<String> {
        self.formatted_ingredients().into_iter().find(|ingredient| {
            let lowered = ingredient.to_lowercase();
            MAIN_SPIRITS.iter().any(|spirit| lowered.contains(spirit))
        })
    }

    pub fn is_same_drink(&self, cocktail: &Cocktail) -> bool {
        normalize_name(&self.cocktail.name) == normalize_name(&cocktail.name)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Narrows a user's saved cocktails. The default matches everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct SavedCocktailFilter {
    pub favorites_only: bool,
    pub spirit: Option<Spirit>
}

impl SavedCocktailFilter {
    pub fn matches(&self, saved: &SavedCocktail) -> bool {
        (!self.favorites_only || saved.is_favorite)
            && self.spirit.map_or(true, |spirit| ingredients::contains_spirit(&saved.cocktail, spirit))
    }
}

/// A saved cocktail as listed to clients, with its display fields filled in.
#[derive(Serialize, Clone, Debug)]
pub struct SavedCocktailView {
    #[serde(flatten)]
    pub saved: SavedCocktail,
    #[serde(rename = "mainSpirit")]
    pub main_spirit: Option<String>,
    #[serde(rename = "formattedIngredients")]
    pub formatted_ingredients: Vec<String>
}

impl From<SavedCocktail> for SavedCocktailView {
    fn from(saved: SavedCocktail) -> Self {
        SavedCocktailView {
            main_spirit: saved.main_spirit(),
            formatted_ingredients: saved.formatted_ingredients(),
            saved
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct FavoritesUpdate {
    pub ids: Vec<String>,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool
}
