use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use lunar_errors::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use text_size::{TextRange, TextSize};

use super::iter::{
    Children, ChildrenWithTokens, Preorder, PreorderWithTokens, SlotChildren, WalkEvent, WalkEventWithTokens,
};
use super::{SyntaxElement, SyntaxToken, SyntaxTrivia};
use crate::green::{GreenElement, GreenNode};
use crate::{NodeOrToken, SyntaxKind, TokenAtOffset, walk};

/// Structured trivia facades are keyed by the trivia's identity and offset.
type StructureKey = (usize, TextSize);

/// A green node seen at a position in a tree.
///
/// Red nodes are created on demand while navigating and are cheap to clone.
/// Two red nodes compare equal when they wrap the same green node at the
/// same offset.
#[derive(Clone)]
pub struct SyntaxNode {
    data: Arc<NodeData>,
}

struct NodeData {
    green: GreenNode,
    parent: Option<ParentLink>,
    offset: TextSize,
    structures: Mutex<FxHashMap<StructureKey, Weak<NodeData>>>,
}

#[derive(Clone)]
enum ParentLink {
    Node { node: SyntaxNode, slot: usize },
    Trivia(SyntaxTrivia),
}

impl SyntaxNode {
    /// Wraps `green` as the root of a tree starting at offset zero.
    pub fn new_root(green: GreenNode) -> Self {
        Self::alloc(green, None, TextSize::new(0))
    }

    fn alloc(green: GreenNode, parent: Option<ParentLink>, offset: TextSize) -> Self {
        let data = NodeData { green, parent, offset, structures: Mutex::default() };
        Self { data: Arc::new(data) }
    }

    pub(super) fn new_child(parent: &Self, slot: usize, green: GreenNode, offset: TextSize) -> Self {
        Self::alloc(green, Some(ParentLink::Node { node: parent.clone(), slot }), offset)
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.data.green.kind()
    }

    #[inline]
    pub fn green(&self) -> &GreenNode {
        &self.data.green
    }

    /// Range including the leading trivia of the first token and the
    /// trailing trivia of the last one.
    #[inline]
    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.data.offset, self.data.green.width())
    }

    /// Range without the outermost trivia.
    pub fn span(&self) -> TextRange {
        let range = self.text_range();
        let start = range.start() + self.data.green.leading_trivia_width();
        let end = range.end() - self.data.green.trailing_trivia_width();
        if start <= end { TextRange::new(start, end) } else { TextRange::empty(start) }
    }

    /// Full text, trivia included.
    pub fn text(&self) -> String {
        self.data.green.to_string()
    }

    /// Text of [`Self::span`].
    pub fn text_trimmed(&self) -> String {
        let mut text = String::new();
        // Writing to a `String` cannot fail.
        let _ = self.data.green.write_to(&mut text, false, false);
        text
    }

    pub fn is_missing(&self) -> bool {
        self.data.green.is_missing()
    }

    /// Parent node, looking through lists.
    ///
    /// The root of a structured trivia tree has no parent; see
    /// [`Self::structured_trivia`].
    pub fn parent(&self) -> Option<Self> {
        let (parent, _) = self.raw_parent()?;
        if parent.kind() == SyntaxKind::LIST { parent.parent() } else { Some(parent.clone()) }
    }

    /// Parent and slot without skipping lists.
    pub(crate) fn raw_parent(&self) -> Option<(&Self, usize)> {
        match &self.data.parent {
            Some(ParentLink::Node { node, slot }) => Some((node, *slot)),
            _ => None,
        }
    }

    /// The trivia owning this node, when it is the root of a directive or
    /// skipped tokens.
    pub fn structured_trivia(&self) -> Option<&SyntaxTrivia> {
        match &self.data.parent {
            Some(ParentLink::Trivia(trivia)) => Some(trivia),
            _ => None,
        }
    }

    /// This node followed by its parents, lists skipped.
    pub fn ancestors(&self) -> impl Iterator<Item = Self> + use<> {
        std::iter::successors(Some(self.clone()), Self::parent)
    }

    /// Child at `index`, `None` for an empty slot.
    ///
    /// # Panics
    ///
    /// When `index` is past the node's arity.
    #[track_caller]
    pub fn slot(&self, index: usize) -> Option<SyntaxElement> {
        let green = self.data.green.slot(index)?.clone();
        let offset = self.data.offset
            + self.data.green.slots().take(index).flatten().map(|child| child.width()).sum::<TextSize>();
        Some(self.element(index, green, offset))
    }

    pub(super) fn element(&self, slot: usize, green: GreenElement, offset: TextSize) -> SyntaxElement {
        match green {
            NodeOrToken::Node(node) => NodeOrToken::Node(Self::new_child(self, slot, node, offset)),
            NodeOrToken::Token(token) => {
                NodeOrToken::Token(SyntaxToken::new(Some(self.clone()), slot, token, offset))
            }
        }
    }

    /// Present children in slot order, lists included as nodes.
    pub fn slots(&self) -> SlotChildren {
        SlotChildren::new(self.clone())
    }

    /// Child nodes with lists flattened.
    pub fn children(&self) -> Children {
        Children::new(self.children_with_tokens())
    }

    /// Child nodes and tokens with lists flattened.
    pub fn children_with_tokens(&self) -> ChildrenWithTokens {
        ChildrenWithTokens::new(self.slots())
    }

    pub fn first_child_by_kind(&self, kind: SyntaxKind) -> Option<Self> {
        self.children().find(|child| child.kind() == kind)
    }

    pub fn first_token(&self) -> Option<SyntaxToken> {
        self.slots().find_map(|child| child.first_token())
    }

    pub fn last_token(&self) -> Option<SyntaxToken> {
        self.slots().rev().find_map(|child| child.last_token())
    }

    /// Preorder over this node and its descendants, lists skipped.
    pub fn descendants(&self) -> impl Iterator<Item = Self> + use<> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node),
            WalkEvent::Leave(_) => None,
        })
    }

    pub fn descendants_with_tokens(&self) -> impl Iterator<Item = SyntaxElement> + use<> {
        self.preorder_with_tokens().filter_map(|event| match event {
            WalkEventWithTokens::EnterNode(node) => Some(NodeOrToken::Node(node)),
            WalkEventWithTokens::Token(token) => Some(NodeOrToken::Token(token)),
            WalkEventWithTokens::LeaveNode(_) => None,
        })
    }

    pub fn preorder(&self) -> Preorder {
        Preorder::new(self.clone())
    }

    pub fn preorder_with_tokens(&self) -> PreorderWithTokens {
        PreorderWithTokens::new(self.clone())
    }

    /// Child whose range contains `offset`. At the very end of the node the
    /// last child wins.
    fn child_at_offset(&self, offset: TextSize) -> Option<SyntaxElement> {
        let end = self.text_range().end();
        let mut last = None;
        for child in self.slots() {
            let range = child.text_range();
            if range.contains(offset) {
                return Some(child);
            }
            if !range.is_empty() {
                last = Some(child);
            }
        }
        if offset == end { last } else { None }
    }

    /// Token whose full range contains `offset`.
    ///
    /// With `find_inside_trivia`, a position inside a directive or skipped
    /// tokens answers the token of the structured trivia instead of the one
    /// the trivia is attached to. Returns `None` outside the node.
    pub fn find_token(&self, offset: TextSize, find_inside_trivia: bool) -> Option<SyntaxToken> {
        if !self.text_range().contains_inclusive(offset) {
            return None;
        }
        let mut node = self.clone();
        loop {
            match node.child_at_offset(offset)? {
                NodeOrToken::Node(child) => node = child,
                NodeOrToken::Token(token) => {
                    if find_inside_trivia {
                        let inner = token
                            .trivia_at_offset(offset)
                            .and_then(|trivia| trivia.structure())
                            .and_then(|structure| structure.find_token(offset, true));
                        if inner.is_some() {
                            return inner;
                        }
                    }
                    return Some(token);
                }
            }
        }
    }

    /// Zero, one or two tokens touching `offset`.
    pub fn token_at_offset(&self, offset: TextSize) -> TokenAtOffset<SyntaxToken> {
        let Some(token) = self.find_token(offset, false) else {
            return TokenAtOffset::None;
        };
        let range = self.text_range();
        if token.text_range().start() == offset && offset > range.start() {
            let previous = token
                .prev_token()
                .filter(|previous| previous.text_range().start() >= range.start());
            if let Some(previous) = previous {
                return TokenAtOffset::Between(previous, token);
            }
        }
        TokenAtOffset::Single(token)
    }

    /// Smallest element whose range contains `range`.
    ///
    /// # Panics
    ///
    /// When `range` is not inside this node.
    #[track_caller]
    pub fn covering_element(&self, range: TextRange) -> SyntaxElement {
        assert!(
            self.text_range().contains_range(range),
            "{range:?} is outside of {:?}@{:?}",
            self.kind(),
            self.text_range()
        );
        let mut node = self.clone();
        let mut covering = self.clone();
        loop {
            let child = node.slots().find(|child| {
                let child_range = child.text_range();
                child_range.contains_range(range) && (!child_range.is_empty() || range.is_empty())
            });
            match child {
                Some(NodeOrToken::Node(child)) => {
                    if child.kind() != SyntaxKind::LIST {
                        covering = child.clone();
                    }
                    node = child;
                }
                Some(NodeOrToken::Token(token)) => return NodeOrToken::Token(token),
                None => return NodeOrToken::Node(covering),
            }
        }
    }

    /// Every diagnostic in the subtree, with absolute ranges.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        if !self.data.green.contains_diagnostics() {
            return Vec::new();
        }
        let offset = self.data.offset;
        walk::diagnostics(&self.data.green).map(|diagnostic| diagnostic.shifted(offset)).collect()
    }

    /// Facade of a structured trivia attached to a token of this node.
    ///
    /// Facades are cached per node with weak references: repeated requests
    /// return the same facade for as long as someone holds it.
    pub(super) fn structure_of(&self, trivia: &SyntaxTrivia, green: &GreenNode) -> Self {
        let key = (trivia.green().key(), trivia.text_range().start());
        if let Some(data) = self.data.structures.lock().get(&key).and_then(Weak::upgrade) {
            tracing::trace!(kind = ?green.kind(), "structured trivia cache hit");
            return Self { data };
        }

        tracing::trace!(kind = ?green.kind(), "structured trivia cache miss");
        let built = Self::new_structure(trivia.clone(), green.clone());

        let mut structures = self.data.structures.lock();
        if let Some(data) = structures.get(&key).and_then(Weak::upgrade) {
            return Self { data };
        }
        structures.retain(|_, facade| facade.strong_count() > 0);
        structures.insert(key, Arc::downgrade(&built.data));
        built
    }

    pub(super) fn new_structure(trivia: SyntaxTrivia, green: GreenNode) -> Self {
        let offset = trivia.text_range().start();
        Self::alloc(green, Some(ParentLink::Trivia(trivia)), offset)
    }

    /// Whether both handles share their allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Indented dump of the subtree with ranges, tokens and trivia.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        // Writing to a `String` cannot fail.
        let _ = self.dump(&mut out, 0);
        out
    }

    fn dump(&self, out: &mut String, depth: usize) -> fmt::Result {
        writeln!(out, "{:indent$}{:?}@{:?}", "", self.kind(), self.text_range(), indent = depth * 2)?;
        for child in self.children_with_tokens() {
            match child {
                NodeOrToken::Node(node) => node.dump(out, depth + 1)?,
                NodeOrToken::Token(token) => {
                    let indent = (depth + 1) * 2;
                    for trivia in token.leading_trivia() {
                        writeln!(out, "{:indent$}{trivia:?}", "")?;
                    }
                    writeln!(out, "{:indent$}{token:?}", "")?;
                    for trivia in token.trailing_trivia() {
                        writeln!(out, "{:indent$}{trivia:?}", "")?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        self.data.green.ptr_eq(&other.data.green) && self.data.offset == other.data.offset
    }
}

impl Eq for SyntaxNode {}

impl Hash for SyntaxNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.green.key().hash(state);
        self.data.offset.hash(state);
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data.green, f)
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.text_range())
    }
}
