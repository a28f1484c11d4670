use crate::api::models::{ Cocktail, Spirit };

/// "<measure> <ingredient>" per filled slot, in slot order. Slots without an
/// ingredient are skipped and blank measures are dropped.
pub fn format_ingredient_list(cocktail: &Cocktail) -> Vec<String> {
    cocktail
        .measured_ingredients()
        .into_iter()
        .filter_map(|(measure, ingredient)| {
            let ingredient = ingredient.filter(|ingredient| !ingredient.is_empty())?;
            match measure.map(str::trim).filter(|measure| !measure.is_empty()) {
                Some(measure) => Some(format!("{} {}", measure, ingredient)),
                None => Some(ingredient.to_string())
            }
        })
        .collect()
}

pub fn format_ingredients(cocktail: &Cocktail) -> String {
    format_ingredient_list(cocktail).join(", ")
}

/// True when any ingredient mentions one of the spirit's verification terms.
/// The backend's ingredient filter also matches drinks tagged with a spirit
/// they don't actually list, so the filter result alone can't be trusted.
pub fn contains_spirit(cocktail: &Cocktail, spirit: Spirit) -> bool {
    let terms = spirit.verification_terms();
    cocktail
        .ingredients()
        .into_iter()
        .flatten()
        .map(|ingredient| ingredient.to_lowercase())
        .any(|ingredient| terms.iter().any(|term| ingredient.contains(term)))
}
