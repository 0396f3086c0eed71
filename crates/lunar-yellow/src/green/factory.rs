//! Free-standing constructors used by producers of green trees.

use smol_str::SmolStr;

use super::{GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList, TokenValue};
use crate::{SyntaxKind, facts};

/// Builds a token of any kind.
///
/// Well-known kinds spelled their usual way take the cached representation;
/// identifiers keep their text; everything else becomes a literal carrying
/// `value`.
#[track_caller]
pub fn token(
    leading: GreenTriviaList,
    kind: SyntaxKind,
    text: &str,
    value: TokenValue,
    trailing: GreenTriviaList,
) -> GreenToken {
    if kind.is_well_known() {
        assert_eq!(text, facts::kind_to_text(kind), "{kind:?} is always spelled the same way");
        return GreenToken::with_trivia(leading, kind, trailing);
    }
    if kind == SyntaxKind::IDENTIFIER {
        return GreenToken::identifier(leading, text, trailing);
    }
    GreenToken::literal(leading, kind, text, value, trailing)
}

pub fn identifier(text: impl Into<SmolStr>) -> GreenToken {
    GreenToken::identifier(GreenTriviaList::empty(), text, GreenTriviaList::empty())
}

#[track_caller]
pub fn trivia(kind: SyntaxKind, text: impl Into<SmolStr>) -> GreenTrivia {
    GreenTrivia::new(kind, text)
}

#[track_caller]
pub fn missing_token(kind: SyntaxKind) -> GreenToken {
    GreenToken::missing(kind)
}

/// List node holding `elements` in order.
pub fn list(elements: impl IntoIterator<Item = GreenElement>) -> GreenNode {
    GreenNode::new(SyntaxKind::LIST, elements.into_iter().map(Some))
}

/// List node alternating `elements` with `separators`.
///
/// # Panics
///
/// Unless there is exactly one separator fewer than elements, or as many
/// when the list ends with a trailing separator.
#[track_caller]
pub fn separated_list(
    elements: impl IntoIterator<Item = GreenElement>,
    separators: impl IntoIterator<Item = GreenToken>,
) -> GreenNode {
    let elements: Vec<GreenElement> = elements.into_iter().collect();
    let separators: Vec<GreenToken> = separators.into_iter().collect();
    assert!(
        separators.len() + 1 == elements.len() || separators.len() == elements.len(),
        "{} elements cannot be separated by {} separators",
        elements.len(),
        separators.len()
    );

    let mut slots = Vec::with_capacity(elements.len() + separators.len());
    let mut separators = separators.into_iter();
    for element in elements {
        slots.push(Some(element));
        if let Some(separator) = separators.next() {
            slots.push(Some(separator.into()));
        }
    }
    GreenNode::new(SyntaxKind::LIST, slots)
}
