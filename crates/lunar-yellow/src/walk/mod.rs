mod accumulator;
mod rewriter;
mod visitor;
mod walker;

pub use accumulator::{Accumulate, Accumulator, Diagnostics, Tokens, Trivia, diagnostics, tokens, trivia};
pub use rewriter::Rewriter;
pub use visitor::Visitor;
pub use walker::{SyntaxWalker, WalkerDepth};
