//! Lexer and right-hand-side value model for production rules.
//!

pub mod lexer;

pub mod data;

pub mod rhs;

pub mod loader;
pub use loader::{LoadError, LoadOutcome, ProductionLoader, ProductionParser, Rejection, SourceTag};

#[cfg(feature = "render")]
mod render;
#[cfg(feature = "render")]
pub use render::render_actions;
