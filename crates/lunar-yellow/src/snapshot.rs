//! Serializable form of a green tree.
//!
//! A snapshot is a post-order table of entries. Children are referenced by
//! index and always come before their parent, so an element shared between
//! several parents is written once and restored as a single allocation.

use std::sync::Arc;

use lunar_errors::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use text_size::TextSize;

use crate::green::side_table::SideData;
use crate::green::{
    GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList, NodeFlags, SyntaxAnnotation, TokenRepr,
    TokenValue,
};
use crate::{NodeOrToken, SyntaxKind};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot has no entries")]
    Empty,
    #[error("entry {index}: unknown kind {raw}")]
    UnknownKind { index: usize, raw: u16 },
    #[error("entry {index}: {kind:?} cannot be used here")]
    UnexpectedKind { index: usize, kind: SyntaxKind },
    #[error("entry {index}: reference to entry {target}, which is not an earlier {expected}")]
    BadReference { index: usize, target: u32, expected: &'static str },
    #[error("entry {index}: recorded width {recorded:?}, restored {restored:?}")]
    WidthMismatch { index: usize, recorded: TextSize, restored: TextSize },
    #[error("entry {index}: recorded flags {recorded:#x}, restored {restored:#x}")]
    FlagMismatch { index: usize, recorded: u16, restored: u16 },
    #[error("the last entry must be a node")]
    RootNotNode,
}

/// A green tree flattened for storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GreenSnapshot {
    entries: Vec<Entry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Entry {
    Node {
        kind: u16,
        width: TextSize,
        flags: u16,
        slots: Vec<Option<u32>>,
        #[serde(default, skip_serializing_if = "Side::is_empty")]
        side: Side,
    },
    Token {
        kind: u16,
        width: TextSize,
        flags: u16,
        leading: Vec<u32>,
        repr: Repr,
        trailing: Vec<u32>,
        #[serde(default, skip_serializing_if = "Side::is_empty")]
        side: Side,
    },
    Trivia {
        kind: u16,
        text: SmolStr,
        flags: u16,
        structure: Option<u32>,
        #[serde(default, skip_serializing_if = "Side::is_empty")]
        side: Side,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Repr {
    WellKnown,
    Identifier { text: SmolStr, contextual_kind: u16 },
    Literal { text: SmolStr, value: TokenValue },
    Missing,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Side {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    annotations: Vec<SyntaxAnnotation>,
}

impl Side {
    fn new(diagnostics: Arc<[Diagnostic]>, annotations: Arc<[SyntaxAnnotation]>) -> Self {
        Self { diagnostics: diagnostics.to_vec(), annotations: annotations.to_vec() }
    }

    fn is_empty(&self) -> bool {
        self.diagnostics.is_empty() && self.annotations.is_empty()
    }

    fn to_side_data(&self) -> SideData {
        SideData { diagnostics: self.diagnostics.as_slice().into(), annotations: self.annotations.as_slice().into() }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Identity {
    Node(usize),
    Token(usize),
    Trivia(usize),
}

#[derive(Default)]
struct Writer {
    entries: Vec<Entry>,
    seen: FxHashMap<Identity, u32>,
}

impl Writer {
    fn push(&mut self, identity: Identity, entry: Entry) -> u32 {
        let index = self.entries.len() as u32;
        self.entries.push(entry);
        self.seen.insert(identity, index);
        index
    }

    fn node(&mut self, node: &GreenNode) -> u32 {
        if let Some(&index) = self.seen.get(&Identity::Node(node.key())) {
            return index;
        }
        let slots = node
            .slots()
            .map(|slot| {
                slot.map(|element| match element {
                    NodeOrToken::Node(node) => self.node(node),
                    NodeOrToken::Token(token) => self.token(token),
                })
            })
            .collect();
        let entry = Entry::Node {
            kind: node.kind().raw(),
            width: node.width(),
            flags: node.flags().bits(),
            slots,
            side: Side::new(node.diagnostics(), node.annotations()),
        };
        self.push(Identity::Node(node.key()), entry)
    }

    fn token(&mut self, token: &GreenToken) -> u32 {
        if let Some(&index) = self.seen.get(&Identity::Token(token.key())) {
            return index;
        }
        let leading = self.trivia_list(token.leading_trivia());
        let trailing = self.trivia_list(token.trailing_trivia());
        let repr = match token.repr() {
            TokenRepr::WellKnown => Repr::WellKnown,
            TokenRepr::Identifier { text, contextual_kind } => {
                Repr::Identifier { text: text.clone(), contextual_kind: contextual_kind.raw() }
            }
            TokenRepr::Literal { text, value } => Repr::Literal { text: text.clone(), value: value.clone() },
            TokenRepr::Missing => Repr::Missing,
        };
        let entry = Entry::Token {
            kind: token.kind().raw(),
            width: token.width(),
            flags: token.flags().bits(),
            leading,
            repr,
            trailing,
            side: Side::new(token.diagnostics(), token.annotations()),
        };
        self.push(Identity::Token(token.key()), entry)
    }

    fn trivia_list(&mut self, list: &GreenTriviaList) -> Vec<u32> {
        list.iter().map(|piece| self.trivia(piece)).collect()
    }

    fn trivia(&mut self, trivia: &GreenTrivia) -> u32 {
        if let Some(&index) = self.seen.get(&Identity::Trivia(trivia.key())) {
            return index;
        }
        let structure = trivia.structure().map(|node| self.node(node));
        let entry = Entry::Trivia {
            kind: trivia.kind().raw(),
            text: SmolStr::new(trivia.text()),
            flags: trivia.flags().bits(),
            structure,
            side: Side::new(trivia.diagnostics(), trivia.annotations()),
        };
        self.push(Identity::Trivia(trivia.key()), entry)
    }
}

enum Restored {
    Node(GreenNode),
    Token(GreenToken),
    Trivia(GreenTrivia),
}

struct Reader {
    restored: Vec<Restored>,
}

impl Reader {
    fn kind(&self, raw: u16) -> Result<SyntaxKind, SnapshotError> {
        SyntaxKind::from_raw(raw).ok_or(SnapshotError::UnknownKind { index: self.restored.len(), raw })
    }

    fn unexpected(&self, kind: SyntaxKind) -> SnapshotError {
        SnapshotError::UnexpectedKind { index: self.restored.len(), kind }
    }

    fn lookup(&self, target: u32, expected: &'static str) -> Result<&Restored, SnapshotError> {
        let error = SnapshotError::BadReference { index: self.restored.len(), target, expected };
        self.restored.get(target as usize).ok_or(error)
    }

    fn element(&self, target: u32) -> Result<GreenElement, SnapshotError> {
        match self.lookup(target, "node or token")? {
            Restored::Node(node) => Ok(NodeOrToken::Node(node.clone())),
            Restored::Token(token) => Ok(NodeOrToken::Token(token.clone())),
            Restored::Trivia(_) => Err(SnapshotError::BadReference {
                index: self.restored.len(),
                target,
                expected: "node or token",
            }),
        }
    }

    fn structure(&self, target: u32) -> Result<GreenNode, SnapshotError> {
        match self.lookup(target, "node")? {
            Restored::Node(node) => Ok(node.clone()),
            _ => Err(SnapshotError::BadReference { index: self.restored.len(), target, expected: "node" }),
        }
    }

    fn trivia_list(&self, pieces: &[u32]) -> Result<GreenTriviaList, SnapshotError> {
        let pieces = pieces
            .iter()
            .map(|&target| match self.lookup(target, "trivia")? {
                Restored::Trivia(trivia) => Ok(trivia.clone()),
                _ => Err(SnapshotError::BadReference { index: self.restored.len(), target, expected: "trivia" }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GreenTriviaList::new(pieces))
    }

    fn check(&self, recorded: (TextSize, u16), restored: (TextSize, NodeFlags)) -> Result<(), SnapshotError> {
        let index = self.restored.len();
        if recorded.0 != restored.0 {
            return Err(SnapshotError::WidthMismatch { index, recorded: recorded.0, restored: restored.0 });
        }
        if recorded.1 != restored.1.bits() {
            return Err(SnapshotError::FlagMismatch { index, recorded: recorded.1, restored: restored.1.bits() });
        }
        Ok(())
    }

    fn read(&self, entry: &Entry) -> Result<Restored, SnapshotError> {
        match entry {
            Entry::Node { kind, width, flags, slots, side } => {
                let kind = self.kind(*kind)?;
                if !kind.is_node() {
                    return Err(self.unexpected(kind));
                }
                let slots = slots
                    .iter()
                    .map(|slot| slot.map(|target| self.element(target)).transpose())
                    .collect::<Result<Vec<_>, _>>()?;
                let mut node = GreenNode::new(kind, slots);
                if !side.is_empty() {
                    node = node.with_side_data(side.to_side_data());
                }
                self.check((*width, *flags), (node.width(), node.flags()))?;
                Ok(Restored::Node(node))
            }
            Entry::Token { kind, width, flags, leading, repr, trailing, side } => {
                let kind = self.kind(*kind)?;
                let leading = self.trivia_list(leading)?;
                let trailing = self.trivia_list(trailing)?;
                let mut token = match repr {
                    Repr::WellKnown if kind.is_well_known() => GreenToken::with_trivia(leading, kind, trailing),
                    Repr::Identifier { text, contextual_kind } if kind == SyntaxKind::IDENTIFIER => {
                        let contextual_kind = self.kind(*contextual_kind)?;
                        if contextual_kind != SyntaxKind::IDENTIFIER && !contextual_kind.is_contextual_keyword() {
                            return Err(self.unexpected(contextual_kind));
                        }
                        GreenToken::contextual_identifier(leading, contextual_kind, text.clone(), trailing)
                    }
                    Repr::Literal { text, value } if kind.is_textual_token() && kind != SyntaxKind::IDENTIFIER => {
                        GreenToken::literal(leading, kind, text.clone(), value.clone(), trailing)
                    }
                    Repr::Missing if kind.is_token() => GreenToken::missing_with_trivia(leading, kind, trailing),
                    _ => return Err(self.unexpected(kind)),
                };
                if !side.is_empty() {
                    token = token.with_side_data(side.to_side_data());
                }
                self.check((*width, *flags), (token.width(), token.flags()))?;
                Ok(Restored::Token(token))
            }
            Entry::Trivia { kind, text, flags, structure, side } => {
                let kind = self.kind(*kind)?;
                let mut trivia = match structure {
                    Some(target) => {
                        let node = self.structure(*target)?;
                        if node.kind() != kind {
                            return Err(self.unexpected(kind));
                        }
                        GreenTrivia::structured(node)
                    }
                    None if kind.is_trivia() && !kind.is_structured_trivia() => {
                        if NodeFlags::from_bits(*flags).is_some_and(|flags| flags.contains(NodeFlags::IS_ELASTIC)) {
                            GreenTrivia::elastic(text.clone())
                        } else {
                            GreenTrivia::new(kind, text.clone())
                        }
                    }
                    None => return Err(self.unexpected(kind)),
                };
                if trivia.kind() != kind {
                    return Err(self.unexpected(kind));
                }
                if !side.is_empty() {
                    trivia = trivia.with_side_data(side.to_side_data());
                }
                self.check((TextSize::of(text.as_str()), *flags), (trivia.width(), trivia.flags()))?;
                Ok(Restored::Trivia(trivia))
            }
        }
    }
}

impl GreenSnapshot {
    pub fn capture(root: &GreenNode) -> Self {
        let mut writer = Writer::default();
        writer.node(root);
        tracing::trace!(entries = writer.entries.len(), "captured green snapshot");
        Self { entries: writer.entries }
    }

    /// Rebuilds the tree, checking every recorded width and flag set
    /// against what the restored elements compute.
    pub fn restore(&self) -> Result<GreenNode, SnapshotError> {
        if self.entries.is_empty() {
            return Err(SnapshotError::Empty);
        }
        let mut reader = Reader { restored: Vec::with_capacity(self.entries.len()) };
        for entry in &self.entries {
            let element = reader.read(entry)?;
            reader.restored.push(element);
        }
        match reader.restored.pop() {
            Some(Restored::Node(root)) => {
                tracing::debug!(entries = self.entries.len(), kind = ?root.kind(), "restored green snapshot");
                Ok(root)
            }
            _ => Err(SnapshotError::RootNotNode),
        }
    }

    /// Number of distinct elements recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use lunar_errors::{Diagnostic, DiagnosticCode};
    use text_size::TextSize;

    use super::*;
    use crate::green::{GreenTrivia, factory};

    fn sample() -> GreenNode {
        let shared = GreenNode::new(
            SyntaxKind::IDENTIFIER_NAME,
            [Some(
                GreenToken::identifier(
                    GreenTriviaList::empty(),
                    "x",
                    GreenTriviaList::single(GreenTrivia::whitespace(" ")),
                )
                .into(),
            )],
        );
        let directive = GreenNode::new(
            SyntaxKind::DEFINE_DIRECTIVE_TRIVIA,
            [
                Some(GreenToken::new(SyntaxKind::DOLLAR).into()),
                Some(
                    GreenToken::contextual_identifier(
                        GreenTriviaList::empty(),
                        SyntaxKind::DEFINE_KW,
                        "define",
                        GreenTriviaList::single(GreenTrivia::whitespace(" ")),
                    )
                    .into(),
                ),
                Some(factory::identifier("DEBUG").into()),
                Some(GreenToken::new(SyntaxKind::END_OF_DIRECTIVE).into()),
            ],
        );
        let number = GreenToken::literal(
            GreenTriviaList::new([GreenTrivia::structured(directive), GreenTrivia::end_of_line("\n")]),
            SyntaxKind::NUMERIC_LITERAL,
            "0x10",
            TokenValue::Integer(16),
            GreenTriviaList::empty(),
        )
        .with_diagnostics(vec![Diagnostic::new(DiagnosticCode::InvalidNumber, TextSize::new(14), TextSize::new(4))]);
        let number = GreenNode::new(SyntaxKind::NUMERIC_LITERAL_EXPR, [Some(number.into())]);

        GreenNode::new(
            SyntaxKind::EXPRESSION_LIST_FUNCTION_ARGUMENT,
            [
                Some(GreenToken::new(SyntaxKind::L_PAREN).into()),
                Some(
                    factory::separated_list(
                        [shared.clone().into(), shared.into(), number.into()],
                        [GreenToken::new(SyntaxKind::COMMA), GreenToken::new(SyntaxKind::COMMA)],
                    )
                    .into(),
                ),
                Some(GreenToken::missing(SyntaxKind::R_PAREN).into()),
            ],
        )
    }

    #[test]
    fn restores_text_and_shape() {
        let root = sample();
        let restored = GreenSnapshot::capture(&root).restore().unwrap();
        assert_eq!(restored.to_string(), root.to_string());
        assert_eq!(restored.width(), root.width());
        assert_eq!(restored.flags(), root.flags());
        assert!(restored.contains_directives());
        assert!(restored.slot(2).unwrap().as_token().unwrap().is_missing());
    }

    #[test]
    fn shared_elements_stay_shared() {
        let root = sample();
        let snapshot = GreenSnapshot::capture(&root);
        let restored = snapshot.restore().unwrap();

        let list = restored.slot(1).and_then(|slot| slot.as_node()).unwrap();
        let first = list.slot(0).and_then(|slot| slot.as_node()).unwrap();
        let second = list.slot(2).and_then(|slot| slot.as_node()).unwrap();
        assert!(first.ptr_eq(second));

        let unshared = GreenSnapshot::capture(&factory::list([sample().into(), sample().into()]));
        assert!(unshared.len() > snapshot.len());
    }

    #[test]
    fn side_data_survives() {
        let annotation = SyntaxAnnotation::with_kind("rename").with_data("y");
        let root = sample().with_annotations(vec![annotation.clone()]);
        let restored = GreenSnapshot::capture(&root).restore().unwrap();

        assert_eq!(restored.annotations().as_ref(), [annotation]);
        let diagnostics: Vec<_> = crate::walk::diagnostics(&restored).map(|d| (d.code(), d.range())).collect();
        assert_eq!(diagnostics, [(DiagnosticCode::InvalidNumber, text_size::TextRange::new(21.into(), 25.into()))]);
    }

    #[test]
    fn elastic_trivia_round_trips() {
        let elastic = || GreenTriviaList::single(GreenTrivia::elastic(" "));
        let keyword = GreenToken::with_trivia(elastic(), SyntaxKind::BREAK_KW, elastic());
        let root = GreenNode::new(SyntaxKind::BREAK_STMT, [Some(keyword.into()), None]);

        let restored = GreenSnapshot::capture(&root).restore().unwrap();
        assert_eq!(restored.to_string(), " break ");
        assert_eq!(restored.width(), root.width());
        let token = restored.slot(0).and_then(|slot| slot.as_token()).unwrap();
        assert!(token.trailing_trivia().is_elastic());
    }

    #[test]
    fn json_round_trip() {
        let snapshot = GreenSnapshot::capture(&sample());
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GreenSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.restore().unwrap().to_string(), "(x ,x ,$define DEBUG\n0x10");
    }

    #[test]
    fn corrupted_snapshots_are_rejected() {
        assert_eq!(GreenSnapshot { entries: Vec::new() }.restore(), Err(SnapshotError::Empty));

        let mut snapshot = GreenSnapshot::capture(&sample());
        if let Some(Entry::Node { width, .. }) = snapshot.entries.last_mut() {
            *width += TextSize::new(1);
        }
        let index = snapshot.len() - 1;
        assert!(matches!(snapshot.restore(), Err(SnapshotError::WidthMismatch { index: i, .. }) if i == index));

        let mut snapshot = GreenSnapshot::capture(&sample());
        snapshot.entries.swap(0, 1);
        assert!(snapshot.restore().is_err());

        let mut snapshot = GreenSnapshot::capture(&sample());
        snapshot.entries.truncate(1);
        assert_eq!(snapshot.restore(), Err(SnapshotError::RootNotNode));

        let mut snapshot = GreenSnapshot::capture(&sample());
        if let Some(Entry::Node { kind, .. }) = snapshot.entries.last_mut() {
            *kind = u16::MAX;
        }
        assert!(matches!(snapshot.restore(), Err(SnapshotError::UnknownKind { raw: u16::MAX, .. })));
    }
}
