use rocket::serde::Serialize;
use crate::api::models::Cocktail;

/// What the presentation layer sees of the selection controller.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(crate = "rocket::serde")]
pub struct SelectionSnapshot {
    #[serde(rename = "currentDrink")]
    pub current_drink: String,
    #[serde(rename = "currentIngredients")]
    pub current_ingredients: String,
    #[serde(rename = "currentCocktail")]
    pub current_cocktail: Option<Cocktail>,
    #[serde(rename = "isLoading")]
    pub is_loading: bool,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
    #[serde(rename = "noMoreCocktails")]
    pub no_more_cocktails: bool
}
