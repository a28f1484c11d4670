use std::fmt;
use std::str::FromStr;
use rocket::request::FromParam;
use serde::{ Deserialize, Serialize };
use crate::api::models::CocktailError;

/// The spirits a user can ask for.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Spirit {
    Gin,
    Vodka,
    Rum,
    Tequila,
    Whisky
}

impl Spirit {
    pub const ALL: [Spirit; 5] = [Spirit::Gin, Spirit::Vodka, Spirit::Rum, Spirit::Tequila, Spirit::Whisky];

    pub fn name(&self) -> &'static str {
        match self {
            Spirit::Gin => "Gin",
            Spirit::Vodka => "Vodka",
            Spirit::Rum => "Rum",
            Spirit::Tequila => "Tequila",
            Spirit::Whisky => "Whisky"
        }
    }

    /// Terms sent to the backend's ingredient filter. The backend has no
    /// "Whisky" ingredient, so that one fans out over its sub-variants.
    pub fn query_terms(&self) -> &'static [&'static str] {
        match self {
            Spirit::Gin => &["Gin"],
            Spirit::Vodka => &["Vodka"],
            Spirit::Rum => &["Rum"],
            Spirit::Tequila => &["Tequila"],
            Spirit::Whisky => &["Whiskey", "Bourbon", "Scotch", "Rye"]
        }
    }

    /// Lowercase substrings at least one ingredient must contain.
    pub fn verification_terms(&self) -> &'static [&'static str] {
        match self {
            Spirit::Gin => &["gin"],
            Spirit::Vodka => &["vodka"],
            Spirit::Rum => &["rum", "light rum", "dark rum", "white rum", "spiced rum"],
            Spirit::Tequila => &["tequila", "mezcal"],
            Spirit::Whisky => &["whisky", "whiskey", "bourbon", "rye", "scotch", "irish whiskey"]
        }
    }
}

impl fmt::Display for Spirit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Spirit {
    type Err = CocktailError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        Spirit::ALL
            .iter()
            .copied()
            .find(|spirit| spirit.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CocktailError::InvalidRequest(format!("Unknown spirit \"{}\"", trimmed)))
    }
}

impl<'a> FromParam<'a> for Spirit {
    type Error = CocktailError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}
