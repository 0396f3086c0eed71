use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::{GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList, NodeFlags, TokenValue};
use crate::SyntaxKind;

const MAX_CACHED_SLOTS: usize = 3;
const MAX_CACHED_TEXT: usize = 16;

/// Slot identities. Children are kept alive by the cached node, so their
/// addresses cannot be reused while the entry exists.
type NodeKey = (SyntaxKind, [usize; MAX_CACHED_SLOTS], u8);
type TriviaKey = (SyntaxKind, SmolStr);
type TokenKey = (SyntaxKind, SmolStr, TokenValue, usize, usize);

/// Hash-consing of small green elements.
///
/// Reusing one cache across parses makes identical subtrees share their
/// allocation. Elements owning diagnostics or annotations are never cached.
#[derive(Default)]
pub struct GreenNodeCache {
    nodes: FxHashMap<NodeKey, GreenNode>,
    tokens: FxHashMap<TokenKey, GreenToken>,
    trivia: FxHashMap<TriviaKey, GreenTrivia>,
    lists: FxHashMap<usize, GreenTriviaList>,
}

impl GreenNodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, kind: SyntaxKind, slots: Vec<Option<GreenElement>>) -> GreenNode {
        let Some(key) = Self::node_key(kind, &slots) else {
            return GreenNode::new(kind, slots);
        };
        self.nodes.entry(key).or_insert_with(|| GreenNode::new(kind, slots)).clone()
    }

    fn node_key(kind: SyntaxKind, slots: &[Option<GreenElement>]) -> Option<NodeKey> {
        if slots.len() > MAX_CACHED_SLOTS {
            return None;
        }
        let mut key = [0; MAX_CACHED_SLOTS];
        for (index, slot) in slots.iter().enumerate() {
            if let Some(child) = slot {
                if child.flags().intersects(NodeFlags::CONTAINS_DIAGNOSTICS | NodeFlags::CONTAINS_ANNOTATIONS) {
                    return None;
                }
                key[index] = child.key();
            }
        }
        Some((kind, key, slots.len() as u8))
    }

    /// Whitespace, line breaks and short comments are shared.
    pub fn trivia(&mut self, kind: SyntaxKind, text: &str) -> GreenTrivia {
        let cacheable = matches!(
            kind,
            SyntaxKind::WHITESPACE | SyntaxKind::END_OF_LINE | SyntaxKind::SINGLE_LINE_COMMENT
        ) && text.len() <= MAX_CACHED_TEXT;
        if !cacheable {
            return GreenTrivia::new(kind, text);
        }
        self.trivia
            .entry((kind, SmolStr::new(text)))
            .or_insert_with(|| GreenTrivia::new(kind, text))
            .clone()
    }

    /// Builds a trivia list. Lists of one cacheable piece are shared.
    pub fn trivia_list(&mut self, pieces: Vec<GreenTrivia>) -> GreenTriviaList {
        if pieces.len() == 1 && self.owns(&pieces[0]) {
            let key = pieces[0].key();
            return self.lists.entry(key).or_insert_with(|| GreenTriviaList::new(pieces)).clone();
        }
        GreenTriviaList::new(pieces)
    }

    fn owns(&self, piece: &GreenTrivia) -> bool {
        self.trivia.get(&(piece.kind(), SmolStr::new(piece.text()))).is_some_and(|cached| cached.ptr_eq(piece))
    }

    /// Builds a token; identifiers and short literals whose trivia lists
    /// came from this cache are shared.
    pub fn token(
        &mut self,
        leading: GreenTriviaList,
        kind: SyntaxKind,
        text: &str,
        value: TokenValue,
        trailing: GreenTriviaList,
    ) -> GreenToken {
        if kind.is_well_known() {
            return GreenToken::with_trivia(leading, kind, trailing);
        }

        let cacheable = matches!(
            kind,
            SyntaxKind::IDENTIFIER | SyntaxKind::NUMERIC_LITERAL | SyntaxKind::STRING_LITERAL
        ) && text.len() <= MAX_CACHED_TEXT
            && self.owns_list(&leading)
            && self.owns_list(&trailing);
        if !cacheable {
            return super::factory::token(leading, kind, text, value, trailing);
        }

        let key = (kind, SmolStr::new(text), value.clone(), list_key(&leading), list_key(&trailing));
        self.tokens
            .entry(key)
            .or_insert_with(|| super::factory::token(leading, kind, text, value, trailing))
            .clone()
    }

    fn owns_list(&self, list: &GreenTriviaList) -> bool {
        match list.pieces() {
            [] => true,
            [piece] => self.lists.get(&piece.key()).is_some_and(|cached| cached.ptr_eq(list)),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.tokens.len() + self.trivia.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn list_key(list: &GreenTriviaList) -> usize {
    list.pieces().first().map_or(0, GreenTrivia::key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(cache: &mut GreenNodeCache, text: &str) -> GreenNode {
        let space = cache.trivia(SyntaxKind::WHITESPACE, " ");
        let trailing = cache.trivia_list(vec![space]);
        let token = cache.token(
            GreenTriviaList::empty(),
            SyntaxKind::IDENTIFIER,
            text,
            TokenValue::None,
            trailing,
        );
        cache.node(SyntaxKind::IDENTIFIER_NAME, vec![Some(token.into())])
    }

    #[test]
    fn identical_small_nodes_are_shared() {
        let mut cache = GreenNodeCache::new();
        let first = name(&mut cache, "value");
        let second = name(&mut cache, "value");
        let other = name(&mut cache, "other");

        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&other));
    }

    #[test]
    fn foreign_trivia_is_not_cached() {
        let mut cache = GreenNodeCache::new();
        let foreign = GreenTriviaList::single(GreenTrivia::whitespace(" "));
        let first = cache.token(
            GreenTriviaList::empty(),
            SyntaxKind::IDENTIFIER,
            "x",
            TokenValue::None,
            foreign.clone(),
        );
        let second =
            cache.token(GreenTriviaList::empty(), SyntaxKind::IDENTIFIER, "x", TokenValue::None, foreign);
        assert!(!first.ptr_eq(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn large_nodes_are_built_fresh() {
        let mut cache = GreenNodeCache::new();
        let slots = || -> Vec<Option<GreenElement>> { vec![Some(GreenToken::new(SyntaxKind::COMMA).into()); 4] };
        let first = cache.node(SyntaxKind::LIST, slots());
        let second = cache.node(SyntaxKind::LIST, slots());
        assert!(!first.ptr_eq(&second));
    }
}
