mod iter;
mod node;
mod ptr;
#[cfg(test)]
mod tests;
mod token;
mod trivia;

use text_size::TextRange;

pub use iter::{
    Children, ChildrenWithTokens, Preorder, PreorderWithTokens, SlotChildren, WalkEvent, WalkEventWithTokens,
};
pub use node::SyntaxNode;
pub use ptr::SyntaxNodePtr;
pub use token::SyntaxToken;
pub use trivia::SyntaxTrivia;

use crate::{NodeOrToken, SyntaxKind};

pub type SyntaxElement = NodeOrToken<SyntaxNode, SyntaxToken>;

impl SyntaxElement {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn text_range(&self) -> TextRange {
        match self {
            NodeOrToken::Node(node) => node.text_range(),
            NodeOrToken::Token(token) => token.text_range(),
        }
    }

    pub fn parent(&self) -> Option<SyntaxNode> {
        match self {
            NodeOrToken::Node(node) => node.parent(),
            NodeOrToken::Token(token) => token.parent(),
        }
    }

    /// The token itself, or the first token below the node.
    pub fn first_token(&self) -> Option<SyntaxToken> {
        match self {
            NodeOrToken::Node(node) => node.first_token(),
            NodeOrToken::Token(token) => Some(token.clone()),
        }
    }

    pub fn last_token(&self) -> Option<SyntaxToken> {
        match self {
            NodeOrToken::Node(node) => node.last_token(),
            NodeOrToken::Token(token) => Some(token.clone()),
        }
    }
}
