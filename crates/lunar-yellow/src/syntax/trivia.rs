use std::fmt;

use text_size::{TextRange, TextSize};

use super::{SyntaxNode, SyntaxToken};
use crate::SyntaxKind;
use crate::green::GreenTrivia;

/// A trivia piece seen at a position in a tree, attached to its token.
#[derive(Clone)]
pub struct SyntaxTrivia {
    token: SyntaxToken,
    index: usize,
    is_leading: bool,
    green: GreenTrivia,
    offset: TextSize,
}

impl SyntaxTrivia {
    pub(super) fn new(
        token: SyntaxToken,
        index: usize,
        is_leading: bool,
        green: GreenTrivia,
        offset: TextSize,
    ) -> Self {
        Self { token, index, is_leading, green, offset }
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    #[inline]
    pub fn green(&self) -> &GreenTrivia {
        &self.green
    }

    #[inline]
    pub fn text(&self) -> &str {
        self.green.text()
    }

    #[inline]
    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.width())
    }

    /// The token this piece is attached to.
    #[inline]
    pub fn token(&self) -> &SyntaxToken {
        &self.token
    }

    /// Position within the leading or trailing list.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn is_leading(&self) -> bool {
        self.is_leading
    }

    #[inline]
    pub fn has_structure(&self) -> bool {
        self.green.has_structure()
    }

    /// Red root of a directive or skipped-tokens trivia.
    ///
    /// When the owning token sits in a tree, the facade is cached on the
    /// token's parent and later calls hand out the same facade while it is
    /// alive. Detached tokens build a fresh facade every time.
    pub fn structure(&self) -> Option<SyntaxNode> {
        let green = self.green.structure()?;
        match self.token.parent() {
            Some(parent) => Some(parent.structure_of(self, green)),
            None => Some(SyntaxNode::new_structure(self.clone(), green.clone())),
        }
    }
}

impl PartialEq for SyntaxTrivia {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token && self.index == other.index && self.is_leading == other.is_leading
    }
}

impl Eq for SyntaxTrivia {}

impl fmt::Display for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Debug for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.text_range(), self.text())
    }
}
