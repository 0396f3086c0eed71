//! The green layer: immutable, position-independent and freely shared.

mod cache;
pub mod factory;
mod flags;
mod node;
pub(crate) mod side_table;
mod token;
mod trivia;
pub(crate) mod well_known;

pub use cache::GreenNodeCache;
pub use flags::NodeFlags;
pub use node::{GreenElement, GreenElementRef, GreenNode};
pub use side_table::SyntaxAnnotation;
pub(crate) use token::TokenRepr;
pub use token::{GreenToken, TokenValue};
pub use trivia::{GreenTrivia, GreenTriviaList, classify_comment};
pub use well_known::elastic_marker;
