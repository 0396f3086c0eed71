use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc as StdArc;

use lunar_errors::Diagnostic;
use smol_str::SmolStr;
use text_size::TextSize;
use triomphe::{Arc, ThinArc};

use super::side_table::{self, SideData, SyntaxAnnotation};
use super::{GreenNode, NodeFlags};
use crate::SyntaxKind;

/// One piece of trivia: whitespace, a line break, a comment, disabled text or
/// a structured node such as a directive.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenTrivia {
    ptr: Arc<GreenTriviaData>,
}

#[derive(PartialEq, Eq, Hash)]
struct GreenTriviaData {
    kind: SyntaxKind,
    flags: NodeFlags,
    text: SmolStr,
    structure: Option<GreenNode>,
}

impl Drop for GreenTriviaData {
    fn drop(&mut self) {
        side_table::release(self as *const Self as usize, self.flags);
    }
}

/// Decides between single- and multi-line for comment `text`.
///
/// `--[[`, `--[==[` and `/*` open multi-line comments; anything else, including
/// a bare `--`, is single-line.
pub fn classify_comment(text: &str) -> SyntaxKind {
    if text.starts_with("/*") {
        return SyntaxKind::MULTI_LINE_COMMENT;
    }
    if text.starts_with("//") {
        return SyntaxKind::SINGLE_LINE_COMMENT;
    }

    let bytes = text.as_bytes();
    if bytes.len() <= 2 || bytes[2] != b'[' {
        return SyntaxKind::SINGLE_LINE_COMMENT;
    }

    let mut index = 3;
    while index < bytes.len() && bytes[index] == b'=' {
        index += 1;
    }

    if bytes.get(index) == Some(&b'[') {
        SyntaxKind::MULTI_LINE_COMMENT
    } else {
        SyntaxKind::SINGLE_LINE_COMMENT
    }
}

impl GreenTrivia {
    /// Creates unstructured trivia. Comment kinds are reclassified from
    /// `text`.
    #[track_caller]
    pub fn new(kind: SyntaxKind, text: impl Into<SmolStr>) -> Self {
        assert!(
            kind.is_trivia() && !kind.is_structured_trivia(),
            "{kind:?} is not an unstructured trivia kind"
        );
        let text = text.into();
        let kind = if kind.is_comment() { classify_comment(&text) } else { kind };
        Self::alloc(kind, NodeFlags::NONE, text, None)
    }

    pub fn whitespace(text: impl Into<SmolStr>) -> Self {
        Self::new(SyntaxKind::WHITESPACE, text)
    }

    pub fn end_of_line(text: impl Into<SmolStr>) -> Self {
        Self::new(SyntaxKind::END_OF_LINE, text)
    }

    pub fn comment(text: impl Into<SmolStr>) -> Self {
        Self::new(SyntaxKind::SINGLE_LINE_COMMENT, text)
    }

    /// Wraps a directive or skipped-tokens node as trivia.
    #[track_caller]
    pub fn structured(node: GreenNode) -> Self {
        assert!(node.kind().is_structured_trivia(), "{:?} cannot be structured trivia", node.kind());
        let flags = node.flags().inherited() | NodeFlags::IS_STRUCTURED_TRIVIA;
        Self::alloc(node.kind(), flags, node.to_string().into(), Some(node))
    }

    /// Whitespace that formatters may replace freely.
    pub fn elastic(text: impl Into<SmolStr>) -> Self {
        Self::alloc(SyntaxKind::WHITESPACE, NodeFlags::IS_ELASTIC, text.into(), None)
    }

    pub(crate) fn alloc(
        kind: SyntaxKind,
        flags: NodeFlags,
        text: SmolStr,
        structure: Option<GreenNode>,
    ) -> Self {
        Self { ptr: Arc::new(GreenTriviaData { kind, flags, text, structure }) }
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.ptr.kind
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.ptr.text
    }

    #[inline]
    pub fn width(&self) -> TextSize {
        TextSize::of(self.ptr.text.as_str())
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.ptr.flags
    }

    #[inline]
    pub fn structure(&self) -> Option<&GreenNode> {
        self.ptr.structure.as_ref()
    }

    #[inline]
    pub fn has_structure(&self) -> bool {
        self.ptr.structure.is_some()
    }

    #[inline]
    pub fn is_elastic(&self) -> bool {
        self.flags().contains(NodeFlags::IS_ELASTIC)
    }

    #[inline]
    pub fn is_comment(&self) -> bool {
        self.kind().is_comment()
    }

    pub fn diagnostics(&self) -> StdArc<[Diagnostic]> {
        side_table::diagnostics(self.key(), self.flags())
    }

    pub fn annotations(&self) -> StdArc<[SyntaxAnnotation]> {
        side_table::annotations(self.key(), self.flags())
    }

    /// Returns a copy carrying `diagnostics` instead of its own.
    pub fn with_diagnostics(&self, diagnostics: impl Into<StdArc<[Diagnostic]>>) -> Self {
        self.with_side_data(SideData { diagnostics: diagnostics.into(), annotations: self.annotations() })
    }

    pub fn with_annotations(&self, annotations: impl Into<StdArc<[SyntaxAnnotation]>>) -> Self {
        self.with_side_data(SideData { diagnostics: self.diagnostics(), annotations: annotations.into() })
    }

    pub(crate) fn with_side_data(&self, data: SideData) -> Self {
        let intrinsic = self.flags().intersection(NodeFlags::IS_STRUCTURED_TRIVIA | NodeFlags::IS_ELASTIC);
        let children = self.structure().map_or(NodeFlags::NONE, GreenNode::flags);
        let flags = NodeFlags::compose(intrinsic, children, data.own_flags());
        let copy = Self::alloc(self.kind(), flags, self.ptr.text.clone(), self.ptr.structure.clone());
        data.store(copy.key());
        copy
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ptr, &other.ptr)
    }

    #[inline]
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.ptr) as usize
    }
}

impl fmt::Display for GreenTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Debug for GreenTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.kind(), self.text())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct TriviaListHeader {
    width: TextSize,
    flags: NodeFlags,
}

/// Run of trivia on one side of a token. The empty list does not allocate.
#[derive(Clone, Default)]
pub struct GreenTriviaList {
    ptr: Option<ThinArc<TriviaListHeader, GreenTrivia>>,
}

impl GreenTriviaList {
    pub const fn empty() -> Self {
        Self { ptr: None }
    }

    pub fn new(pieces: impl IntoIterator<Item = GreenTrivia>) -> Self {
        let pieces: Vec<GreenTrivia> = pieces.into_iter().collect();
        if pieces.is_empty() {
            return Self::empty();
        }

        let header = TriviaListHeader {
            width: pieces.iter().map(GreenTrivia::width).sum(),
            flags: pieces.iter().fold(NodeFlags::NONE, |flags, piece| flags | piece.flags().inherited()),
        };

        Self { ptr: Some(ThinArc::from_header_and_iter(header, pieces.into_iter())) }
    }

    pub fn single(piece: GreenTrivia) -> Self {
        Self::new([piece])
    }

    #[inline]
    pub fn width(&self) -> TextSize {
        self.ptr.as_ref().map_or(TextSize::new(0), |ptr| ptr.header.header.width)
    }

    /// Union of the pieces' inherited flags.
    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.ptr.as_ref().map_or(NodeFlags::NONE, |ptr| ptr.header.header.flags)
    }

    #[inline]
    pub fn pieces(&self) -> &[GreenTrivia] {
        self.ptr.as_ref().map_or(&[], |ptr| &ptr.slice)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pieces().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GreenTrivia> {
        self.pieces().iter()
    }

    /// Whether every piece is elastic.
    pub fn is_elastic(&self) -> bool {
        !self.is_empty() && self.iter().all(GreenTrivia::is_elastic)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.ptr, &other.ptr) {
            (None, None) => true,
            (Some(left), Some(right)) => std::ptr::eq(&left.header, &right.header),
            _ => false,
        }
    }

    /// Whether the list is exactly one piece of `kind` spelled `text`.
    pub(crate) fn is_single(&self, kind: SyntaxKind, text: &str) -> bool {
        matches!(self.pieces(), [piece] if piece.kind() == kind && piece.text() == text && !piece.is_elastic())
    }

    /// Whether the list is exactly one empty elastic piece.
    pub(crate) fn is_elastic_marker(&self) -> bool {
        matches!(self.pieces(), [piece] if piece.is_elastic() && piece.text().is_empty())
    }
}

impl PartialEq for GreenTriviaList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.pieces() == other.pieces()
    }
}

impl Eq for GreenTriviaList {}

impl Hash for GreenTriviaList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pieces().hash(state);
    }
}

impl<'a> IntoIterator for &'a GreenTriviaList {
    type Item = &'a GreenTrivia;
    type IntoIter = std::slice::Iter<'a, GreenTrivia>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<GreenTrivia> for GreenTriviaList {
    fn from_iter<T: IntoIterator<Item = GreenTrivia>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for GreenTriviaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|piece| fmt::Display::fmt(piece, f))
    }
}

impl fmt::Debug for GreenTriviaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
