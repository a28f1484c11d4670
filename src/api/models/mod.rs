mod cocktail;
mod cocktail_error;
mod spirit;
mod selection_snapshot;
mod saved_cocktail;
mod user;
mod generic_error;
pub mod resources_xml;

pub use cocktail::*;
pub use cocktail_error::*;
pub use spirit::*;
pub use selection_snapshot::*;
pub use saved_cocktail::*;
pub use user::*;
pub use generic_error::*;
