//! Lossless syntax trees for Lua 5.1 through 5.4 and GLua.
//!
//! The green layer is immutable and position-independent so that subtrees
//! can be shared between trees and across edits. The red layer in
//! [`syntax`] is a lazily built view over it that knows parents and
//! absolute offsets.

/// Typed wrappers over red nodes.
pub mod ast;
mod directives;
/// Lexical and grammatical facts, parameterized by dialect.
pub mod facts;
/// Immutable green elements, their caches and constructors.
pub mod green;
mod node_or_token;
mod snapshot;
/// Parent- and position-aware view over green trees.
pub mod syntax;
mod syntax_kind;
mod syntax_set;
mod version;
/// Visitors, rewriters and accumulators over green trees, plus a walker
/// over red trees.
pub mod walk;

pub use directives::{Directive, DirectiveStack};
pub use green::{
    GreenElement, GreenNode, GreenNodeCache, GreenToken, GreenTrivia, GreenTriviaList, NodeFlags,
    SyntaxAnnotation, TokenValue,
};
pub use node_or_token::{NodeOrToken, TokenAtOffset};
pub use snapshot::{GreenSnapshot, SnapshotError};
pub use syntax::{SyntaxElement, SyntaxNode, SyntaxNodePtr, SyntaxToken, SyntaxTrivia};
pub use syntax_kind::SyntaxKind;
pub use syntax_set::SyntaxSet;
pub use version::{LuaVersion, SyntaxOptions, UnknownVersion, VersionSet};
