use std::fmt;
use std::hash::{Hash, Hasher};

use lunar_errors::Diagnostic;
use text_size::{TextRange, TextSize};

use super::iter::SlotChildren;
use super::{SyntaxNode, SyntaxTrivia};
use crate::green::{GreenToken, GreenTriviaList};
use crate::{SyntaxKind, TokenValue};

/// A green token seen at a position in a tree.
#[derive(Clone)]
pub struct SyntaxToken {
    parent: Option<SyntaxNode>,
    slot: usize,
    green: GreenToken,
    offset: TextSize,
}

impl SyntaxToken {
    pub(super) fn new(parent: Option<SyntaxNode>, slot: usize, green: GreenToken, offset: TextSize) -> Self {
        Self { parent, slot, green, offset }
    }

    /// A token outside of any tree, starting at offset zero.
    pub fn detached(green: GreenToken) -> Self {
        Self::new(None, 0, green, TextSize::new(0))
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    #[inline]
    pub fn contextual_kind(&self) -> SyntaxKind {
        self.green.contextual_kind()
    }

    #[inline]
    pub fn green(&self) -> &GreenToken {
        &self.green
    }

    /// Text without trivia.
    #[inline]
    pub fn text(&self) -> &str {
        self.green.text()
    }

    pub fn value(&self) -> TokenValue {
        self.green.value()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.green.is_missing()
    }

    /// Range including leading and trailing trivia.
    #[inline]
    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.width())
    }

    /// Range of the token text alone.
    pub fn span(&self) -> TextRange {
        let start = self.offset + self.green.leading_trivia().width();
        TextRange::at(start, self.green.text_width())
    }

    /// Parent node, looking through lists.
    pub fn parent(&self) -> Option<SyntaxNode> {
        let parent = self.parent.as_ref()?;
        if parent.kind() == SyntaxKind::LIST { parent.parent() } else { Some(parent.clone()) }
    }

    /// Ancestors starting from the parent.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        std::iter::successors(self.parent(), SyntaxNode::parent)
    }

    pub fn leading_trivia(&self) -> impl Iterator<Item = SyntaxTrivia> + use<> {
        trivia_of(self.clone(), self.green.leading_trivia().clone(), self.offset, true)
    }

    pub fn trailing_trivia(&self) -> impl Iterator<Item = SyntaxTrivia> + use<> {
        let start = self.span().end();
        trivia_of(self.clone(), self.green.trailing_trivia().clone(), start, false)
    }

    /// Trivia piece whose range contains `offset`.
    pub fn trivia_at_offset(&self, offset: TextSize) -> Option<SyntaxTrivia> {
        if !self.text_range().contains(offset) || self.span().contains(offset) {
            return None;
        }
        self.leading_trivia()
            .chain(self.trailing_trivia())
            .find(|trivia| trivia.text_range().contains(offset))
    }

    /// Next token in the tree, crossing into following subtrees. Within
    /// structured trivia the walk stops at the trivia root.
    pub fn next_token(&self) -> Option<Self> {
        let mut parent = self.parent.clone()?;
        let mut slot = self.slot;
        let mut end = self.text_range().end();
        loop {
            let next = SlotChildren::after(parent.clone(), slot, end).find_map(|sibling| sibling.first_token());
            if next.is_some() {
                return next;
            }
            end = parent.text_range().end();
            let (grandparent, parent_slot) = parent.raw_parent()?;
            let grandparent = grandparent.clone();
            slot = parent_slot;
            parent = grandparent;
        }
    }

    pub fn prev_token(&self) -> Option<Self> {
        let mut parent = self.parent.clone()?;
        let mut slot = self.slot;
        let mut start = self.text_range().start();
        loop {
            let previous =
                SlotChildren::before(parent.clone(), slot, start).rev().find_map(|sibling| sibling.last_token());
            if previous.is_some() {
                return previous;
            }
            start = parent.text_range().start();
            let (grandparent, parent_slot) = parent.raw_parent()?;
            let grandparent = grandparent.clone();
            slot = parent_slot;
            parent = grandparent;
        }
    }

    /// Diagnostics attached to the token and its trivia, with absolute ranges.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> =
            self.green.diagnostics().iter().map(|diagnostic| diagnostic.shifted(self.offset)).collect();
        for trivia in self.leading_trivia().chain(self.trailing_trivia()) {
            let start = trivia.text_range().start();
            diagnostics.extend(trivia.green().diagnostics().iter().map(|diagnostic| diagnostic.shifted(start)));
        }
        diagnostics
    }
}

fn trivia_of(
    token: SyntaxToken,
    list: GreenTriviaList,
    start: TextSize,
    is_leading: bool,
) -> impl Iterator<Item = SyntaxTrivia> {
    let mut offset = start;
    (0..list.len()).map(move |index| {
        let green = list.pieces()[index].clone();
        let at = offset;
        offset += green.width();
        SyntaxTrivia::new(token.clone(), index, is_leading, green, at)
    })
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &Self) -> bool {
        self.green.ptr_eq(&other.green) && self.offset == other.offset
    }
}

impl Eq for SyntaxToken {}

impl Hash for SyntaxToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.green.key().hash(state);
        self.offset.hash(state);
    }
}

impl fmt::Display for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.green, f)
    }
}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.span())?;
        if self.is_missing() {
            return f.write_str(" (missing)");
        }
        if !self.text().is_empty() {
            write!(f, " {:?}", self.text())?;
        }
        Ok(())
    }
}
