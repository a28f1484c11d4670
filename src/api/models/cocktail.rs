use std::hash::{ Hash, Hasher };
use serde::{ Deserialize, Serialize };

/// A recipe record as returned by the recipe backend. The filter endpoint only
/// fills in the name and thumbnail; the search endpoint fills in everything.
/// Identity is the drink name alone.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Cocktail {
    #[serde(rename = "strDrink")]
    pub name: String,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(rename = "strDrinkThumb", default)]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "strIngredient1", default)]
    pub ingredient_1: Option<String>,
    #[serde(rename = "strIngredient2", default)]
    pub ingredient_2: Option<String>,
    #[serde(rename = "strIngredient3", default)]
    pub ingredient_3: Option<String>,
    #[serde(rename = "strIngredient4", default)]
    pub ingredient_4: Option<String>,
    #[serde(rename = "strIngredient5", default)]
    pub ingredient_5: Option<String>,
    #[serde(rename = "strMeasure1", default)]
    pub measure_1: Option<String>,
    #[serde(rename = "strMeasure2", default)]
    pub measure_2: Option<String>,
    #[serde(rename = "strMeasure3", default)]
    pub measure_3: Option<String>,
    #[serde(rename = "strMeasure4", default)]
    pub measure_4: Option<String>,
    #[serde(rename = "strMeasure5", default)]
    pub measure_5: Option<String>
}

impl Cocktail {
    #[cfg(test)]
    pub fn named(name: &str) -> Self {
        Cocktail { name: name.to_string(), ..Default::default() }
    }

    pub fn ingredients(&self) -> [Option<&str>; 5] {
        [
            self.ingredient_1.as_deref(),
            self.ingredient_2.as_deref(),
            self.ingredient_3.as_deref(),
            self.ingredient_4.as_deref(),
            self.ingredient_5.as_deref()
        ]
    }

    /// (measure, ingredient) pairs in slot order 1..5
    pub fn measured_ingredients(&self) -> [(Option<&str>, Option<&str>); 5] {
        [
            (self.measure_1.as_deref(), self.ingredient_1.as_deref()),
            (self.measure_2.as_deref(), self.ingredient_2.as_deref()),
            (self.measure_3.as_deref(), self.ingredient_3.as_deref()),
            (self.measure_4.as_deref(), self.ingredient_4.as_deref()),
            (self.measure_5.as_deref(), self.ingredient_5.as_deref())
        ]
    }
}

impl PartialEq for Cocktail {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Cocktail {}

impl Hash for Cocktail {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Envelope of both backend endpoints. No matches come back as `null`.
#[derive(Deserialize, Debug)]
pub struct CocktailResponse {
    #[serde(default)]
    pub drinks: Option<Vec<Cocktail>>
}
