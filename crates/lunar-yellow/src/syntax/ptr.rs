use text_size::TextRange;

use super::SyntaxNode;
use crate::{NodeOrToken, SyntaxKind};

/// Stable reference to a node by kind and trimmed range.
///
/// Unlike a [`SyntaxNode`] it holds no tree, so it can be stored across
/// threads and resolved against any tree with the same text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxNodePtr {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl SyntaxNodePtr {
    pub fn new(node: &SyntaxNode) -> Self {
        Self { kind: node.kind(), range: node.span() }
    }

    /// Resolves the pointer within `root`, which must be a tree root.
    pub fn try_to_node(&self, root: &SyntaxNode) -> Option<SyntaxNode> {
        if root.parent().is_some() || !root.text_range().contains_range(self.range) {
            return None;
        }

        let start = match root.covering_element(self.range) {
            NodeOrToken::Node(node) => node,
            NodeOrToken::Token(token) => token.parent()?,
        };
        start.ancestors().find(|node| node.kind() == self.kind && node.span() == self.range)
    }

    #[track_caller]
    pub fn to_node(&self, root: &SyntaxNode) -> SyntaxNode {
        match self.try_to_node(root) {
            Some(node) => node,
            None => panic!("{:?}@{:?} does not resolve in {root:?}", self.kind, self.range),
        }
    }
}
