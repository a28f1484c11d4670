mod recipe_service;
mod recipe_service_factory;
mod candidate_supplier;
mod selection_service;
mod cocktail_store;
mod saved_cocktail_service;
mod saved_cocktail_service_factory;
mod auth_service;
mod resource_service;
mod resource_service_factory;
pub mod ingredients;
pub mod models;

pub use recipe_service::*;
pub use recipe_service_factory::*;
pub use candidate_supplier::*;
pub use selection_service::*;
pub use cocktail_store::*;
pub use saved_cocktail_service::*;
pub use saved_cocktail_service_factory::*;
pub use auth_service::*;
pub use resource_service::*;
pub use resource_service_factory::*;

#[cfg(test)]
pub(crate) use candidate_supplier::tests::FakeRecipeSource;
