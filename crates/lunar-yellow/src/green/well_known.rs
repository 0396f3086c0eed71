//! Process-wide table of the tokens every parse produces over and over.

use std::sync::LazyLock;

use super::token::TokenRepr;
use super::{GreenToken, GreenTrivia, GreenTriviaList};
use crate::SyntaxKind;

/// One past the largest well-known discriminant.
const LIMIT: usize = SyntaxKind::IDENTIFIER as usize;

struct WellKnownTokens {
    plain: Box<[Option<GreenToken>]>,
    elastic: Box<[Option<GreenToken>]>,
    trailing_space: Box<[Option<GreenToken>]>,
    trailing_line_feed: Box<[Option<GreenToken>]>,
}

static ELASTIC: LazyLock<GreenTriviaList> =
    LazyLock::new(|| GreenTriviaList::single(GreenTrivia::elastic("")));
static SPACE: LazyLock<GreenTriviaList> =
    LazyLock::new(|| GreenTriviaList::single(GreenTrivia::whitespace(" ")));
static LINE_FEED: LazyLock<GreenTriviaList> =
    LazyLock::new(|| GreenTriviaList::single(GreenTrivia::end_of_line("\n")));

static TOKENS: LazyLock<WellKnownTokens> = LazyLock::new(WellKnownTokens::build);

impl WellKnownTokens {
    fn build() -> Self {
        let table = |leading: &GreenTriviaList, trailing: &GreenTriviaList| {
            let mut table = vec![None; LIMIT];
            for &kind in SyntaxKind::ALL.iter().filter(|kind| kind.is_well_known()) {
                table[kind as usize] =
                    Some(GreenToken::alloc(kind, leading.clone(), TokenRepr::WellKnown, trailing.clone()));
            }
            table.into_boxed_slice()
        };

        let empty = GreenTriviaList::empty();
        let tokens = Self {
            plain: table(&empty, &empty),
            elastic: table(&*ELASTIC, &*ELASTIC),
            trailing_space: table(&empty, &*SPACE),
            trailing_line_feed: table(&empty, &*LINE_FEED),
        };
        tracing::debug!(
            kinds = tokens.plain.iter().flatten().count(),
            "built well-known token table"
        );
        tokens
    }
}

/// Elastic marker list used for synthesized tokens.
pub fn elastic_marker() -> GreenTriviaList {
    ELASTIC.clone()
}

/// Shared token for `kind` with the given trivia, when one exists.
pub(crate) fn lookup(
    kind: SyntaxKind,
    leading: &GreenTriviaList,
    trailing: &GreenTriviaList,
) -> Option<GreenToken> {
    let index = kind as usize;
    if index >= LIMIT {
        return None;
    }

    let tokens = &*TOKENS;
    let table = if leading.is_empty() {
        if trailing.is_empty() {
            &tokens.plain
        } else if trailing.is_single(SyntaxKind::WHITESPACE, " ") {
            &tokens.trailing_space
        } else if trailing.is_single(SyntaxKind::END_OF_LINE, "\n") {
            &tokens.trailing_line_feed
        } else {
            return None;
        }
    } else if leading.is_elastic_marker() && trailing.is_elastic_marker() {
        &tokens.elastic
    } else {
        return None;
    };

    table[index].clone()
}
