//! Lexical and grammatical facts about every dialect.
//!
//! All queries are pure and total: anything unsupported answers `None`, `0`
//! or `false`. Per-version availability is stored once, in the entry tables
//! below, and both the predicates and the enumerations read from it.

use crate::version::{LuaVersion, VersionSet};
use crate::{SyntaxKind, SyntaxSet};

const ALL: VersionSet = VersionSet::ALL;
const SINCE_52: VersionSet = VersionSet::since(LuaVersion::Lua52).with(LuaVersion::GLua);
const SINCE_53: VersionSet = VersionSet::since(LuaVersion::Lua53);
const ONLY_54: VersionSet = VersionSet::since(LuaVersion::Lua54);
const GLUA: VersionSet = VersionSet::only(LuaVersion::GLua);

/// One row of the token table.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TokenEntry {
    pub(crate) kind: SyntaxKind,
    pub(crate) versions: VersionSet,
    /// First historical version that dropped the token again.
    pub(crate) removed_in: Option<LuaVersion>,
}

impl TokenEntry {
    const fn is_available(self, version: LuaVersion) -> bool {
        let removed = match self.removed_in {
            Some(removed) => VersionSet::since(removed).contains(version),
            None => false,
        };
        self.versions.contains(version) && !removed
    }
}

macro_rules! token_table {
    (@removed) => { None };
    (@removed $removed:ident) => { Some(LuaVersion::$removed) };
    ($($kind:ident => $text:literal, $versions:expr $(, removed in $removed:ident)?;)*) => {
        pub(crate) const TOKENS: &[TokenEntry] = &[$(
            TokenEntry {
                kind: SyntaxKind::$kind,
                versions: $versions,
                removed_in: token_table!(@removed $($removed)?),
            }
        ),*];

        /// Fixed spelling of a punctuation, keyword or contextual keyword kind.
        /// Every other kind spells as the empty string.
        pub fn kind_to_text(kind: SyntaxKind) -> &'static str {
            match kind {
                $(SyntaxKind::$kind => $text,)*
                _ => "",
            }
        }

        /// Kind of a fixed spelling, regardless of dialect.
        pub fn text_to_kind(text: &str) -> Option<SyntaxKind> {
            match text {
                $($text => Some(SyntaxKind::$kind),)*
                _ => None,
            }
        }
    };
}

token_table! {
    PLUS => "+", ALL;
    MINUS => "-", ALL;
    STAR => "*", ALL;
    SLASH => "/", ALL;
    SLASH_SLASH => "//", SINCE_53;
    PERCENT => "%", ALL;
    CARET => "^", ALL;
    HASH => "#", ALL;
    AMP => "&", SINCE_53;
    TILDE => "~", SINCE_53;
    PIPE => "|", SINCE_53;
    LT_LT => "<<", SINCE_53;
    GT_GT => ">>", SINCE_53;
    EQ_EQ => "==", ALL;
    TILDE_EQ => "~=", ALL;
    BANG_EQ => "!=", GLUA;
    LT_EQ => "<=", ALL;
    GT_EQ => ">=", ALL;
    LT => "<", ALL;
    GT => ">", ALL;
    EQ => "=", ALL;
    L_PAREN => "(", ALL;
    R_PAREN => ")", ALL;
    L_BRACE => "{", ALL;
    R_BRACE => "}", ALL;
    L_BRACKET => "[", ALL;
    R_BRACKET => "]", ALL;
    SEMICOLON => ";", ALL;
    COLON => ":", ALL;
    COLON_COLON => "::", SINCE_52;
    COMMA => ",", ALL;
    DOT => ".", ALL;
    DOT_DOT => "..", ALL;
    DOT_DOT_DOT => "...", ALL;
    AMP_AMP => "&&", GLUA;
    PIPE_PIPE => "||", GLUA;
    BANG => "!", GLUA;
    DOLLAR => "$", GLUA;

    AND_KW => "and", ALL;
    BREAK_KW => "break", ALL;
    CONTINUE_KW => "continue", GLUA;
    DO_KW => "do", ALL;
    ELSE_KW => "else", ALL;
    ELSEIF_KW => "elseif", ALL;
    END_KW => "end", ALL;
    FALSE_KW => "false", ALL;
    FOR_KW => "for", ALL;
    FUNCTION_KW => "function", ALL;
    GOTO_KW => "goto", SINCE_52;
    IF_KW => "if", ALL;
    IN_KW => "in", ALL;
    LOCAL_KW => "local", ALL;
    NIL_KW => "nil", ALL;
    NOT_KW => "not", ALL;
    OR_KW => "or", ALL;
    REPEAT_KW => "repeat", ALL;
    RETURN_KW => "return", ALL;
    THEN_KW => "then", ALL;
    TRUE_KW => "true", ALL;
    UNTIL_KW => "until", ALL;
    WHILE_KW => "while", ALL;

    CONST_KW => "const", ONLY_54;
    CLOSE_KW => "close", ONLY_54;
    DEFINE_KW => "define", ALL;
    UNDEF_KW => "undef", ALL;
}

const fn availability(version: LuaVersion) -> SyntaxSet {
    let mut set = SyntaxSet::EMPTY;
    let mut i = 0;
    while i < TOKENS.len() {
        let entry = TOKENS[i];
        if entry.is_available(version) {
            set = set.with(entry.kind);
        }
        i += 1;
    }
    set
}

/// Token availability, enumerated once per dialect.
static AVAILABLE: [SyntaxSet; 5] = [
    availability(LuaVersion::Lua51),
    availability(LuaVersion::Lua52),
    availability(LuaVersion::Lua53),
    availability(LuaVersion::Lua54),
    availability(LuaVersion::GLua),
];

#[inline]
fn available(kind: SyntaxKind, version: LuaVersion) -> bool {
    AVAILABLE[version.index()].contains(kind)
}

pub fn is_keyword(kind: SyntaxKind, version: LuaVersion) -> bool {
    kind.is_keyword() && available(kind, version)
}

pub fn is_punctuation(kind: SyntaxKind, version: LuaVersion) -> bool {
    kind.is_punctuation() && available(kind, version)
}

pub fn is_contextual_keyword(kind: SyntaxKind, version: LuaVersion) -> bool {
    kind.is_contextual_keyword() && available(kind, version)
}

/// Reserved word spelled `text` in `version`.
pub fn keyword_kind(text: &str, version: LuaVersion) -> Option<SyntaxKind> {
    text_to_kind(text).filter(|&kind| is_keyword(kind, version))
}

pub fn contextual_keyword_kind(text: &str, version: LuaVersion) -> Option<SyntaxKind> {
    text_to_kind(text).filter(|&kind| is_contextual_keyword(kind, version))
}

pub fn keyword_kinds(version: LuaVersion) -> impl Iterator<Item = SyntaxKind> {
    AVAILABLE[version.index()].iter().filter(|kind| kind.is_keyword())
}

pub fn punctuation_kinds(version: LuaVersion) -> impl Iterator<Item = SyntaxKind> {
    AVAILABLE[version.index()].iter().filter(|kind| kind.is_punctuation())
}

pub fn contextual_keyword_kinds(version: LuaVersion) -> impl Iterator<Item = SyntaxKind> {
    AVAILABLE[version.index()].iter().filter(|kind| kind.is_contextual_keyword())
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct OperatorEntry {
    pub(crate) token: SyntaxKind,
    pub(crate) expression: SyntaxKind,
    pub(crate) versions: VersionSet,
}

const fn op(token: SyntaxKind, expression: SyntaxKind, versions: VersionSet) -> OperatorEntry {
    OperatorEntry { token, expression, versions }
}

use SyntaxKind as K;

pub(crate) const BINARY_OPERATORS: &[OperatorEntry] = &[
    op(K::OR_KW, K::LOGICAL_OR_EXPR, ALL),
    op(K::PIPE_PIPE, K::LOGICAL_OR_EXPR, GLUA),
    op(K::AND_KW, K::LOGICAL_AND_EXPR, ALL),
    op(K::AMP_AMP, K::LOGICAL_AND_EXPR, GLUA),
    op(K::LT, K::LESS_THAN_EXPR, ALL),
    op(K::GT, K::GREATER_THAN_EXPR, ALL),
    op(K::LT_EQ, K::LESS_THAN_OR_EQUAL_EXPR, ALL),
    op(K::GT_EQ, K::GREATER_THAN_OR_EQUAL_EXPR, ALL),
    op(K::TILDE_EQ, K::NOT_EQUALS_EXPR, ALL),
    op(K::BANG_EQ, K::NOT_EQUALS_EXPR, GLUA),
    op(K::EQ_EQ, K::EQUALS_EXPR, ALL),
    op(K::PIPE, K::BITWISE_OR_EXPR, SINCE_53),
    op(K::TILDE, K::EXCLUSIVE_OR_EXPR, SINCE_53),
    op(K::AMP, K::BITWISE_AND_EXPR, SINCE_53),
    op(K::LT_LT, K::LEFT_SHIFT_EXPR, SINCE_53),
    op(K::GT_GT, K::RIGHT_SHIFT_EXPR, SINCE_53),
    op(K::DOT_DOT, K::CONCAT_EXPR, ALL),
    op(K::PLUS, K::ADD_EXPR, ALL),
    op(K::MINUS, K::SUBTRACT_EXPR, ALL),
    op(K::STAR, K::MULTIPLY_EXPR, ALL),
    op(K::SLASH, K::DIVIDE_EXPR, ALL),
    op(K::SLASH_SLASH, K::FLOOR_DIVIDE_EXPR, SINCE_53),
    op(K::PERCENT, K::MODULO_EXPR, ALL),
    op(K::CARET, K::EXPONENTIATE_EXPR, ALL),
];

pub(crate) const UNARY_OPERATORS: &[OperatorEntry] = &[
    op(K::MINUS, K::UNARY_MINUS_EXPR, ALL),
    op(K::NOT_KW, K::LOGICAL_NOT_EXPR, ALL),
    op(K::BANG, K::LOGICAL_NOT_EXPR, GLUA),
    op(K::HASH, K::LENGTH_EXPR, ALL),
    op(K::TILDE, K::BITWISE_NOT_EXPR, SINCE_53),
];

fn lookup(table: &[OperatorEntry], token: SyntaxKind, version: Option<LuaVersion>) -> Option<SyntaxKind> {
    table
        .iter()
        .find(|entry| entry.token == token && version.is_none_or(|version| entry.versions.contains(version)))
        .map(|entry| entry.expression)
}

/// Binary expression kind produced by operator `token` in `version`.
pub fn get_binary_expression(token: SyntaxKind, version: LuaVersion) -> Option<SyntaxKind> {
    lookup(BINARY_OPERATORS, token, Some(version))
}

/// Binary expression kind produced by `token` in any dialect.
pub fn get_binary_expression_in_any_version(token: SyntaxKind) -> Option<SyntaxKind> {
    lookup(BINARY_OPERATORS, token, None)
}

pub fn get_unary_expression(token: SyntaxKind, version: LuaVersion) -> Option<SyntaxKind> {
    lookup(UNARY_OPERATORS, token, Some(version))
}

pub fn get_unary_expression_in_any_version(token: SyntaxKind) -> Option<SyntaxKind> {
    lookup(UNARY_OPERATORS, token, None)
}

pub fn binary_operator_kinds(version: LuaVersion) -> impl Iterator<Item = SyntaxKind> {
    BINARY_OPERATORS.iter().filter(move |entry| entry.versions.contains(version)).map(|entry| entry.token)
}

pub fn unary_operator_kinds(version: LuaVersion) -> impl Iterator<Item = SyntaxKind> {
    UNARY_OPERATORS.iter().filter(move |entry| entry.versions.contains(version)).map(|entry| entry.token)
}

/// Binding power of every unary operator.
///
/// Unary operators bind tighter than every binary operator except `^`,
/// which sits one band above so that `-x ^ 2` is `-(x ^ 2)`.
pub const UNARY_PRECEDENCE: u8 = 11;

/// Binding power of an expression kind. Higher binds tighter, `0` means the
/// kind is not an operator expression.
pub fn expression_precedence(expression: SyntaxKind) -> u8 {
    match expression {
        K::LOGICAL_OR_EXPR => 1,
        K::LOGICAL_AND_EXPR => 2,
        K::LESS_THAN_EXPR
        | K::GREATER_THAN_EXPR
        | K::LESS_THAN_OR_EQUAL_EXPR
        | K::GREATER_THAN_OR_EQUAL_EXPR
        | K::NOT_EQUALS_EXPR
        | K::EQUALS_EXPR => 3,
        K::BITWISE_OR_EXPR => 4,
        K::EXCLUSIVE_OR_EXPR => 5,
        K::BITWISE_AND_EXPR => 6,
        K::LEFT_SHIFT_EXPR | K::RIGHT_SHIFT_EXPR => 7,
        K::CONCAT_EXPR => 8,
        K::ADD_EXPR | K::SUBTRACT_EXPR => 9,
        K::MULTIPLY_EXPR | K::DIVIDE_EXPR | K::FLOOR_DIVIDE_EXPR | K::MODULO_EXPR => 10,
        K::UNARY_MINUS_EXPR | K::LOGICAL_NOT_EXPR | K::LENGTH_EXPR | K::BITWISE_NOT_EXPR => {
            UNARY_PRECEDENCE
        }
        K::EXPONENTIATE_EXPR => 12,
        _ => 0,
    }
}

/// Binding power of operator token `kind` used in unary or binary position.
pub fn operator_precedence(kind: SyntaxKind, is_unary: bool) -> u8 {
    let expression = if is_unary {
        get_unary_expression_in_any_version(kind)
    } else {
        get_binary_expression_in_any_version(kind)
    };
    expression.map_or(0, expression_precedence)
}

/// Accepts either operator tokens or binary expression kinds.
pub fn is_right_associative(kind: SyntaxKind) -> bool {
    matches!(kind, K::CARET | K::DOT_DOT | K::EXPONENTIATE_EXPR | K::CONCAT_EXPR)
}

/// Dialect features that are not tied to a single token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    Goto,
    EmptyStatements,
    HexFloats,
    HexEscapes,
    WhitespaceEscape,
    UnicodeEscape,
    Integers,
    FloorDivision,
    BitwiseOperators,
    LocalAttributes,
    Continue,
    CBooleanOperators,
    CComments,
    Directives,
    NonAsciiIdentifiers,
}

impl Feature {
    const fn versions(self) -> VersionSet {
        match self {
            Self::Goto | Self::EmptyStatements | Self::HexEscapes | Self::WhitespaceEscape => SINCE_52,
            Self::HexFloats => VersionSet::since(LuaVersion::Lua52),
            Self::UnicodeEscape => SINCE_53.with(LuaVersion::GLua),
            Self::Integers | Self::FloorDivision | Self::BitwiseOperators => SINCE_53,
            Self::LocalAttributes => ONLY_54,
            Self::Continue
            | Self::CBooleanOperators
            | Self::CComments
            | Self::Directives
            | Self::NonAsciiIdentifiers => GLUA,
        }
    }

    /// Name used in "not available" diagnostics.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Goto => "`goto`",
            Self::EmptyStatements => "empty statements",
            Self::HexFloats => "hexadecimal floats",
            Self::HexEscapes => "hexadecimal escapes",
            Self::WhitespaceEscape => "`\\z` escapes",
            Self::UnicodeEscape => "unicode escapes",
            Self::Integers => "integers",
            Self::FloorDivision => "floor division",
            Self::BitwiseOperators => "bitwise operators",
            Self::LocalAttributes => "local variable attributes",
            Self::Continue => "`continue`",
            Self::CBooleanOperators => "C-style boolean operators",
            Self::CComments => "C-style comments",
            Self::Directives => "directives",
            Self::NonAsciiIdentifiers => "non-ASCII identifiers",
        }
    }
}

pub fn is_feature_available(feature: Feature, version: LuaVersion) -> bool {
    feature.versions().contains(version)
}

pub fn is_identifier_start(c: char, version: LuaVersion) -> bool {
    c.is_ascii_alphabetic()
        || c == '_'
        || (!c.is_ascii() && is_feature_available(Feature::NonAsciiIdentifiers, version))
}

pub fn is_identifier_continue(c: char, version: LuaVersion) -> bool {
    is_identifier_start(c, version) || c.is_ascii_digit()
}

/// Whether `text` lexes as a single identifier in `version`.
pub fn is_valid_identifier(text: &str, version: LuaVersion) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|first| is_identifier_start(first, version))
        && chars.all(|c| is_identifier_continue(c, version))
        && keyword_kind(text, version).is_none()
}
