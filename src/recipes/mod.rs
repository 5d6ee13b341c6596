//! Concrete component recipes.
//!
//! Recipes are registered explicitly, in build order, by
//! [`default_recipes`].

pub mod binutils;

pub use binutils::BinutilsRecipe;

use crate::core::recipe::ComponentRecipe;

/// The components of the toolchain, in the order they are built.
pub fn default_recipes() -> Vec<Box<dyn ComponentRecipe>> {
    vec![Box::new(BinutilsRecipe::new())]
}
