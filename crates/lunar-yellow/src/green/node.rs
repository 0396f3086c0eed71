use std::fmt;
use std::sync::Arc as StdArc;

use lunar_errors::Diagnostic;
use text_size::TextSize;
use triomphe::Arc;

use super::side_table::{self, SideData, SyntaxAnnotation};
use super::{GreenToken, NodeFlags};
use crate::{NodeOrToken, SyntaxKind};

pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;
pub type GreenElementRef<'a> = NodeOrToken<&'a GreenNode, &'a GreenToken>;

/// Immutable, position-independent interior node.
///
/// Nodes have a fixed number of slots for their kind; an absent optional
/// child is an empty slot, never a shorter array.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenNode {
    ptr: Arc<GreenNodeData>,
}

#[derive(PartialEq, Eq, Hash)]
struct GreenNodeData {
    kind: SyntaxKind,
    flags: NodeFlags,
    width: TextSize,
    slots: Box<[Option<GreenElement>]>,
}

impl Drop for GreenNodeData {
    fn drop(&mut self) {
        side_table::release(self as *const Self as usize, self.flags);
    }
}

impl GreenNode {
    #[track_caller]
    pub fn new(kind: SyntaxKind, slots: impl IntoIterator<Item = Option<GreenElement>>) -> Self {
        assert!(kind.is_node(), "{kind:?} is not a node kind");
        Self::alloc(kind, slots.into_iter().collect(), NodeFlags::NONE)
    }

    fn alloc(kind: SyntaxKind, slots: Box<[Option<GreenElement>]>, own: NodeFlags) -> Self {
        let mut width = TextSize::new(0);
        let mut children = NodeFlags::NONE;
        let mut present = 0usize;
        let mut missing = 0usize;
        for child in slots.iter().flatten() {
            width += child.width();
            children |= child.flags();
            present += 1;
            if child.flags().contains(NodeFlags::IS_MISSING) {
                missing += 1;
            }
        }

        let mut intrinsic = NodeFlags::NONE;
        if present > 0 && present == missing {
            intrinsic |= NodeFlags::IS_MISSING;
        }
        if kind.is_structured_trivia() {
            intrinsic |= NodeFlags::IS_STRUCTURED_TRIVIA;
        }
        if kind.is_directive_trivia() {
            intrinsic |= NodeFlags::CONTAINS_DIRECTIVES;
        }
        if kind == SyntaxKind::SKIPPED_TOKENS_TRIVIA {
            intrinsic |= NodeFlags::CONTAINS_SKIPPED_TEXT;
        }

        let flags = NodeFlags::compose(intrinsic, children, own);
        Self { ptr: Arc::new(GreenNodeData { kind, flags, width, slots }) }
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.ptr.kind
    }

    /// Full width, leading and trailing trivia included.
    #[inline]
    pub fn width(&self) -> TextSize {
        self.ptr.width
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.ptr.flags
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.flags().contains(NodeFlags::IS_MISSING)
    }

    #[inline]
    pub fn contains_diagnostics(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS)
    }

    #[inline]
    pub fn contains_directives(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_DIRECTIVES)
    }

    #[inline]
    pub fn contains_skipped_text(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_SKIPPED_TEXT)
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.ptr.slots.len()
    }

    /// Child at `index`, `None` for an empty slot.
    ///
    /// # Panics
    ///
    /// When `index` is past the node's arity.
    #[track_caller]
    pub fn slot(&self, index: usize) -> Option<&GreenElement> {
        let arity = self.slot_count();
        match self.ptr.slots.get(index) {
            Some(slot) => slot.as_ref(),
            None => panic!("slot {index} out of range for {:?} with {arity} slots", self.kind()),
        }
    }

    pub fn slots(&self) -> impl ExactSizeIterator<Item = Option<&GreenElement>> + '_ {
        self.ptr.slots.iter().map(Option::as_ref)
    }

    /// Present children in slot order.
    pub fn children(&self) -> impl Iterator<Item = &GreenElement> + '_ {
        self.ptr.slots.iter().flatten()
    }

    pub fn first_token(&self) -> Option<&GreenToken> {
        self.children().find_map(|child| match child {
            NodeOrToken::Node(node) => node.first_token(),
            NodeOrToken::Token(token) => Some(token),
        })
    }

    pub fn last_token(&self) -> Option<&GreenToken> {
        self.ptr.slots.iter().rev().flatten().find_map(|child| match child {
            NodeOrToken::Node(node) => node.last_token(),
            NodeOrToken::Token(token) => Some(token),
        })
    }

    /// Width of the leading trivia of the first token.
    pub fn leading_trivia_width(&self) -> TextSize {
        self.first_token().map_or(TextSize::new(0), |token| token.leading_trivia().width())
    }

    pub fn trailing_trivia_width(&self) -> TextSize {
        self.last_token().map_or(TextSize::new(0), |token| token.trailing_trivia().width())
    }

    /// Returns a node of the same kind with `slots`, keeping what this node
    /// owns in the side tables.
    #[track_caller]
    pub fn with_slots(&self, slots: impl IntoIterator<Item = Option<GreenElement>>) -> Self {
        let data = side_table::side_data(self.key(), self.flags());
        let node = Self::alloc(self.kind(), slots.into_iter().collect(), data.own_flags());
        data.store(node.key());
        node
    }

    /// Returns a copy with slot `index` replaced.
    #[track_caller]
    pub fn replace_slot(&self, index: usize, element: Option<GreenElement>) -> Self {
        assert!(index < self.slot_count(), "slot {index} out of range for {:?}", self.kind());
        self.with_slots(
            self.slots()
                .enumerate()
                .map(|(position, slot)| if position == index { element.clone() } else { slot.cloned() }),
        )
    }

    pub fn diagnostics(&self) -> StdArc<[Diagnostic]> {
        side_table::diagnostics(self.key(), self.flags())
    }

    pub fn annotations(&self) -> StdArc<[SyntaxAnnotation]> {
        side_table::annotations(self.key(), self.flags())
    }

    pub fn with_diagnostics(&self, diagnostics: impl Into<StdArc<[Diagnostic]>>) -> Self {
        self.with_side_data(SideData { diagnostics: diagnostics.into(), annotations: self.annotations() })
    }

    pub fn with_annotations(&self, annotations: impl Into<StdArc<[SyntaxAnnotation]>>) -> Self {
        self.with_side_data(SideData { diagnostics: self.diagnostics(), annotations: annotations.into() })
    }

    pub(crate) fn with_side_data(&self, data: SideData) -> Self {
        let node = Self::alloc(self.kind(), self.ptr.slots.clone(), data.own_flags());
        data.store(node.key());
        node
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ptr, &other.ptr)
    }

    #[inline]
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.ptr) as usize
    }

    /// Writes the node text, optionally with the outermost trivia.
    pub fn write_to(&self, out: &mut impl fmt::Write, leading: bool, trailing: bool) -> fmt::Result {
        let first = if leading { None } else { self.first_token() };
        let last = if trailing { None } else { self.last_token() };
        self.write_tokens(out, &mut |token| {
            let keep_leading = first.is_none_or(|first| !first.ptr_eq(token));
            let keep_trailing = last.is_none_or(|last| !last.ptr_eq(token));
            (keep_leading, keep_trailing)
        })
    }

    fn write_tokens(
        &self,
        out: &mut impl fmt::Write,
        trivia: &mut impl FnMut(&GreenToken) -> (bool, bool),
    ) -> fmt::Result {
        for child in self.children() {
            match child {
                NodeOrToken::Node(node) => node.write_tokens(out, trivia)?,
                NodeOrToken::Token(token) => {
                    let (leading, trailing) = trivia(token);
                    token.write_to(out, leading, trailing)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, true, true)
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.width())
    }
}

impl GreenElement {
    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    #[inline]
    pub fn width(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.width(),
            NodeOrToken::Token(token) => token.width(),
        }
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        match self {
            NodeOrToken::Node(node) => node.flags(),
            NodeOrToken::Token(token) => token.flags(),
        }
    }

    /// Identity comparison; equal elements built separately are not `ptr_eq`.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeOrToken::Node(left), NodeOrToken::Node(right)) => left.ptr_eq(right),
            (NodeOrToken::Token(left), NodeOrToken::Token(right)) => left.ptr_eq(right),
            _ => false,
        }
    }

    pub(crate) fn key(&self) -> usize {
        match self {
            NodeOrToken::Node(node) => node.key(),
            NodeOrToken::Token(token) => token.key(),
        }
    }

    pub fn diagnostics(&self) -> StdArc<[Diagnostic]> {
        match self {
            NodeOrToken::Node(node) => node.diagnostics(),
            NodeOrToken::Token(token) => token.diagnostics(),
        }
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        NodeOrToken::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        NodeOrToken::Token(token)
    }
}

impl GreenElementRef<'_> {
    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    #[inline]
    pub fn width(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.width(),
            NodeOrToken::Token(token) => token.width(),
        }
    }
}
