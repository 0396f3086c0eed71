use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc as StdArc;

use lunar_errors::Diagnostic;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use text_size::TextSize;
use triomphe::Arc;

use super::side_table::{self, SideData, SyntaxAnnotation};
use super::{GreenTriviaList, NodeFlags, well_known};
use crate::{SyntaxKind, facts};

/// Decoded value of a literal, keyword literal or identifier token.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum TokenValue {
    #[default]
    None,
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(SmolStr),
}

impl PartialEq for TokenValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) | (Self::Nil, Self::Nil) => true,
            (Self::Boolean(left), Self::Boolean(right)) => left == right,
            (Self::Integer(left), Self::Integer(right)) => left == right,
            (Self::Float(left), Self::Float(right)) => left.to_bits() == right.to_bits(),
            (Self::String(left), Self::String(right)) => left == right,
            _ => false,
        }
    }
}

impl Eq for TokenValue {}

impl Hash for TokenValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::None | Self::Nil => {}
            Self::Boolean(value) => value.hash(state),
            Self::Integer(value) => value.hash(state),
            Self::Float(value) => value.to_bits().hash(state),
            Self::String(value) => value.hash(state),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TokenRepr {
    /// Text comes from [`facts::kind_to_text`].
    WellKnown,
    Identifier { text: SmolStr, contextual_kind: SyntaxKind },
    Literal { text: SmolStr, value: TokenValue },
    Missing,
}

/// A leaf of the green tree together with its leading and trailing trivia.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenToken {
    ptr: Arc<GreenTokenData>,
}

#[derive(PartialEq, Eq, Hash)]
struct GreenTokenData {
    kind: SyntaxKind,
    flags: NodeFlags,
    width: TextSize,
    leading: GreenTriviaList,
    trailing: GreenTriviaList,
    repr: TokenRepr,
}

impl Drop for GreenTokenData {
    fn drop(&mut self) {
        side_table::release(self as *const Self as usize, self.flags);
    }
}

impl GreenToken {
    /// Token of a well-known kind without trivia.
    #[track_caller]
    pub fn new(kind: SyntaxKind) -> Self {
        Self::with_trivia(GreenTriviaList::empty(), kind, GreenTriviaList::empty())
    }

    /// Token of a well-known kind. Common trivia shapes come from a shared
    /// table instead of allocating.
    #[track_caller]
    pub fn with_trivia(leading: GreenTriviaList, kind: SyntaxKind, trailing: GreenTriviaList) -> Self {
        assert!(kind.is_well_known(), "{kind:?} has no fixed text");
        well_known::lookup(kind, &leading, &trailing)
            .unwrap_or_else(|| Self::alloc(kind, leading, TokenRepr::WellKnown, trailing))
    }

    pub fn identifier(leading: GreenTriviaList, text: impl Into<SmolStr>, trailing: GreenTriviaList) -> Self {
        Self::contextual_identifier(leading, SyntaxKind::IDENTIFIER, text, trailing)
    }

    /// Identifier that acts as `contextual_kind` where the grammar expects it.
    #[track_caller]
    pub fn contextual_identifier(
        leading: GreenTriviaList,
        contextual_kind: SyntaxKind,
        text: impl Into<SmolStr>,
        trailing: GreenTriviaList,
    ) -> Self {
        assert!(
            contextual_kind == SyntaxKind::IDENTIFIER || contextual_kind.is_contextual_keyword(),
            "{contextual_kind:?} is not a contextual keyword"
        );
        let repr = TokenRepr::Identifier { text: text.into(), contextual_kind };
        Self::alloc(SyntaxKind::IDENTIFIER, leading, repr, trailing)
    }

    /// Literal or bad token whose text is kept verbatim next to its value.
    #[track_caller]
    pub fn literal(
        leading: GreenTriviaList,
        kind: SyntaxKind,
        text: impl Into<SmolStr>,
        value: TokenValue,
        trailing: GreenTriviaList,
    ) -> Self {
        assert!(
            kind.is_textual_token() && kind != SyntaxKind::IDENTIFIER,
            "{kind:?} is not a literal kind"
        );
        Self::alloc(kind, leading, TokenRepr::Literal { text: text.into(), value }, trailing)
    }

    /// Zero-width placeholder inserted during error recovery.
    #[track_caller]
    pub fn missing(kind: SyntaxKind) -> Self {
        Self::missing_with_trivia(GreenTriviaList::empty(), kind, GreenTriviaList::empty())
    }

    #[track_caller]
    pub fn missing_with_trivia(
        leading: GreenTriviaList,
        kind: SyntaxKind,
        trailing: GreenTriviaList,
    ) -> Self {
        assert!(kind.is_token(), "{kind:?} is not a token kind");
        Self::alloc(kind, leading, TokenRepr::Missing, trailing)
    }

    pub(crate) fn alloc(
        kind: SyntaxKind,
        leading: GreenTriviaList,
        repr: TokenRepr,
        trailing: GreenTriviaList,
    ) -> Self {
        Self::alloc_with_flags(kind, leading, repr, trailing, NodeFlags::NONE)
    }

    fn alloc_with_flags(
        kind: SyntaxKind,
        leading: GreenTriviaList,
        repr: TokenRepr,
        trailing: GreenTriviaList,
        own: NodeFlags,
    ) -> Self {
        let intrinsic =
            if matches!(repr, TokenRepr::Missing) { NodeFlags::IS_MISSING } else { NodeFlags::NONE };
        let flags = NodeFlags::compose(intrinsic, leading.flags() | trailing.flags(), own);
        let width = leading.width() + TextSize::of(repr_text(kind, &repr)) + trailing.width();
        Self { ptr: Arc::new(GreenTokenData { kind, flags, width, leading, trailing, repr }) }
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.ptr.kind
    }

    /// The keyword an identifier stands for in context, otherwise [`Self::kind`].
    pub fn contextual_kind(&self) -> SyntaxKind {
        match &self.ptr.repr {
            TokenRepr::Identifier { contextual_kind, .. } => *contextual_kind,
            _ => self.kind(),
        }
    }

    /// Text without trivia.
    #[inline]
    pub fn text(&self) -> &str {
        repr_text(self.kind(), &self.ptr.repr)
    }

    #[inline]
    pub fn text_width(&self) -> TextSize {
        TextSize::of(self.text())
    }

    /// Full width, trivia included.
    #[inline]
    pub fn width(&self) -> TextSize {
        self.ptr.width
    }

    #[inline]
    pub fn leading_trivia(&self) -> &GreenTriviaList {
        &self.ptr.leading
    }

    #[inline]
    pub fn trailing_trivia(&self) -> &GreenTriviaList {
        &self.ptr.trailing
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.ptr.flags
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.flags().contains(NodeFlags::IS_MISSING)
    }

    pub fn value(&self) -> TokenValue {
        match &self.ptr.repr {
            TokenRepr::Literal { value, .. } => value.clone(),
            TokenRepr::Identifier { text, .. } => TokenValue::String(text.clone()),
            TokenRepr::WellKnown => match self.kind() {
                SyntaxKind::TRUE_KW => TokenValue::Boolean(true),
                SyntaxKind::FALSE_KW => TokenValue::Boolean(false),
                SyntaxKind::NIL_KW => TokenValue::Nil,
                _ => TokenValue::None,
            },
            TokenRepr::Missing => TokenValue::None,
        }
    }

    pub(crate) fn repr(&self) -> &TokenRepr {
        &self.ptr.repr
    }

    pub fn with_leading_trivia(&self, leading: GreenTriviaList) -> Self {
        self.rebuild(leading, self.ptr.trailing.clone())
    }

    pub fn with_trailing_trivia(&self, trailing: GreenTriviaList) -> Self {
        self.rebuild(self.ptr.leading.clone(), trailing)
    }

    fn rebuild(&self, leading: GreenTriviaList, trailing: GreenTriviaList) -> Self {
        let data = side_table::side_data(self.key(), self.flags());
        if matches!(self.ptr.repr, TokenRepr::WellKnown) && data.own_flags() == NodeFlags::NONE {
            return Self::with_trivia(leading, self.kind(), trailing);
        }
        let token = Self::alloc_with_flags(self.kind(), leading, self.ptr.repr.clone(), trailing, data.own_flags());
        data.store(token.key());
        token
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
        let token = Self::alloc_with_flags(
            self.kind(),
            self.ptr.leading.clone(),
            self.ptr.repr.clone(),
            self.ptr.trailing.clone(),
            data.own_flags(),
        );
        data.store(token.key());
        token
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ptr, &other.ptr)
    }

    #[inline]
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.ptr) as usize
    }

    /// Writes the token text, optionally with its outer trivia.
    pub fn write_to(&self, out: &mut impl fmt::Write, leading: bool, trailing: bool) -> fmt::Result {
        if leading {
            write!(out, "{}", self.leading_trivia())?;
        }
        out.write_str(self.text())?;
        if trailing {
            write!(out, "{}", self.trailing_trivia())?;
        }
        Ok(())
    }
}

fn repr_text(kind: SyntaxKind, repr: &TokenRepr) -> &str {
    match repr {
        TokenRepr::WellKnown => facts::kind_to_text(kind),
        TokenRepr::Identifier { text, .. } | TokenRepr::Literal { text, .. } => text,
        TokenRepr::Missing => "",
    }
}

impl fmt::Display for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, true, true)
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.width(), self.text())?;
        if self.is_missing() {
            f.write_str(" (missing)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lunar_errors::DiagnosticCode;

    use super::*;
    use crate::green::{GreenTrivia, elastic_marker};

    fn space() -> GreenTriviaList {
        GreenTriviaList::single(GreenTrivia::whitespace(" "))
    }

    #[test]
    fn width_includes_trivia() {
        let token = GreenToken::identifier(space(), "name", GreenTriviaList::single(GreenTrivia::comment("-- c")));
        assert_eq!(token.width(), TextSize::new(9));
        assert_eq!(token.text(), "name");
        assert_eq!(token.to_string(), " name-- c");
        assert_eq!(token.contextual_kind(), SyntaxKind::IDENTIFIER);
    }

    #[test]
    fn well_known_matches_generic_behaviour() {
        let cached = GreenToken::new(SyntaxKind::FUNCTION_KW);
        let fresh = GreenToken::alloc(
            SyntaxKind::FUNCTION_KW,
            GreenTriviaList::empty(),
            TokenRepr::WellKnown,
            GreenTriviaList::empty(),
        );
        assert_eq!(cached, fresh);
        assert_eq!(cached.text(), "function");
        assert_eq!(cached.width(), TextSize::new(8));
        assert!(cached.ptr_eq(&GreenToken::new(SyntaxKind::FUNCTION_KW)));
    }

    #[test]
    fn elastic_trivia_keeps_its_text() {
        let elastic = || GreenTriviaList::single(GreenTrivia::elastic(" "));
        let token = GreenToken::with_trivia(elastic(), SyntaxKind::DO_KW, elastic());
        assert_eq!(token.to_string(), " do ");
        assert_eq!(token.width(), TextSize::new(4));
        assert!(token.leading_trivia().is_elastic());
        assert!(!token.ptr_eq(&GreenToken::with_trivia(elastic(), SyntaxKind::DO_KW, elastic())));

        let marked = GreenToken::with_trivia(elastic_marker(), SyntaxKind::DO_KW, elastic_marker());
        assert_eq!(marked.to_string(), "do");
        assert_ne!(marked, token);
    }

    #[test]
    fn keyword_literals_have_values() {
        assert_eq!(GreenToken::new(SyntaxKind::TRUE_KW).value(), TokenValue::Boolean(true));
        assert_eq!(GreenToken::new(SyntaxKind::NIL_KW).value(), TokenValue::Nil);
        assert_eq!(GreenToken::new(SyntaxKind::PLUS).value(), TokenValue::None);
    }

    #[test]
    fn missing_tokens_are_empty() {
        let token = GreenToken::missing(SyntaxKind::END_KW);
        assert!(token.is_missing());
        assert_eq!(token.text(), "");
        assert_eq!(token.width(), TextSize::new(0));
    }

    #[test]
    fn replacing_trivia_keeps_the_rest() {
        let token = GreenToken::literal(
            GreenTriviaList::empty(),
            SyntaxKind::NUMERIC_LITERAL,
            "0x10",
            TokenValue::Integer(16),
            GreenTriviaList::empty(),
        );
        let diagnostic = Diagnostic::at_start(DiagnosticCode::InvalidNumber, TextSize::new(4));
        let token = token.with_diagnostics(vec![diagnostic.clone()]);
        let spaced = token.with_leading_trivia(space());

        assert_eq!(spaced.to_string(), " 0x10");
        assert_eq!(spaced.value(), TokenValue::Integer(16));
        assert_eq!(&*spaced.diagnostics(), [diagnostic]);
        assert!(spaced.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS));
    }

    #[test]
    fn contextual_identifiers_report_their_keyword() {
        let token = GreenToken::contextual_identifier(
            GreenTriviaList::empty(),
            SyntaxKind::CONST_KW,
            "const",
            GreenTriviaList::empty(),
        );
        assert_eq!(token.kind(), SyntaxKind::IDENTIFIER);
        assert_eq!(token.contextual_kind(), SyntaxKind::CONST_KW);
        assert_eq!(token.value(), TokenValue::String("const".into()));
    }

    #[test]
    fn float_values_compare_bitwise() {
        assert_eq!(TokenValue::Float(f64::NAN), TokenValue::Float(f64::NAN));
        assert_ne!(TokenValue::Float(0.0), TokenValue::Float(-0.0));
        assert_ne!(TokenValue::Integer(1), TokenValue::Float(1.0));
    }
}
