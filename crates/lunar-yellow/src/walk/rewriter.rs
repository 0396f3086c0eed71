use crate::green::{GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList, NodeFlags, side_table};
use crate::{NodeOrToken, SyntaxKind};

/// Structure-preserving transformation of a green tree.
///
/// Returning the input unchanged (by pointer) from every hook leaves the
/// whole tree shared. When a child changes, only the spine above it is
/// rebuilt; untouched siblings are reused as they are. Hooks can replace a
/// node but never drop it, and a list stays a list.
pub trait Rewriter {
    fn visit_into_structured_trivia(&self) -> bool {
        false
    }

    fn rewrite(&mut self, root: &GreenNode) -> GreenNode {
        self.rewrite_node(root)
    }

    fn rewrite_node(&mut self, node: &GreenNode) -> GreenNode {
        self.rewrite_children(node)
    }

    fn rewrite_token(&mut self, token: &GreenToken) -> GreenToken {
        let leading = self.rewrite_trivia_list(token.leading_trivia());
        let trailing = self.rewrite_trivia_list(token.trailing_trivia());
        match (leading, trailing) {
            (None, None) => token.clone(),
            (leading, trailing) => {
                let token = match leading {
                    Some(leading) => token.with_leading_trivia(leading),
                    None => token.clone(),
                };
                match trailing {
                    Some(trailing) => token.with_trailing_trivia(trailing),
                    None => token,
                }
            }
        }
    }

    fn rewrite_trivia(&mut self, trivia: &GreenTrivia) -> GreenTrivia {
        let Some(structure) = trivia.structure() else {
            return trivia.clone();
        };
        if !self.visit_into_structured_trivia() {
            return trivia.clone();
        }
        let rewritten = self.rewrite_node(structure);
        if rewritten.ptr_eq(structure) {
            return trivia.clone();
        }
        let replacement = GreenTrivia::structured(rewritten);
        if trivia.flags().intersects(NodeFlags::HAS_OWN_DIAGNOSTICS | NodeFlags::HAS_OWN_ANNOTATIONS) {
            replacement.with_side_data(side_table::side_data(trivia.key(), trivia.flags()))
        } else {
            replacement
        }
    }

    /// `None` when every piece came back unchanged.
    fn rewrite_trivia_list(&mut self, list: &GreenTriviaList) -> Option<GreenTriviaList> {
        let mut rebuilt: Option<Vec<GreenTrivia>> = None;
        for (index, piece) in list.iter().enumerate() {
            let rewritten = self.rewrite_trivia(piece);
            if rebuilt.is_none() && !rewritten.ptr_eq(piece) {
                rebuilt = Some(list.pieces()[..index].to_vec());
            }
            if let Some(pieces) = &mut rebuilt {
                pieces.push(rewritten);
            }
        }
        rebuilt.map(GreenTriviaList::new)
    }

    /// Rewrites every child and rebuilds `node` only if one of them changed.
    #[track_caller]
    fn rewrite_children(&mut self, node: &GreenNode) -> GreenNode {
        let mut rebuilt: Option<Vec<Option<GreenElement>>> = None;
        for (index, slot) in node.slots().enumerate() {
            let rewritten = slot.map(|child| match child {
                NodeOrToken::Node(child) => {
                    let rewritten = self.rewrite_node(child);
                    assert_eq!(
                        rewritten.kind() == SyntaxKind::LIST,
                        child.kind() == SyntaxKind::LIST,
                        "{:?} cannot be rewritten to {:?}",
                        child.kind(),
                        rewritten.kind()
                    );
                    NodeOrToken::Node(rewritten)
                }
                NodeOrToken::Token(child) => NodeOrToken::Token(self.rewrite_token(child)),
            });

            let changed = match (&rewritten, slot) {
                (Some(new), Some(old)) => !new.ptr_eq(old),
                _ => false,
            };
            if rebuilt.is_none() && changed {
                rebuilt = Some(node.slots().take(index).map(|slot| slot.cloned()).collect());
            }
            if let Some(slots) = &mut rebuilt {
                slots.push(rewritten);
            }
        }

        match rebuilt {
            Some(slots) => {
                tracing::trace!(kind = ?node.kind(), "rebuilding spine");
                node.with_slots(slots)
            }
            None => node.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use lunar_errors::{Diagnostic, DiagnosticCode};
    use text_size::TextSize;

    use super::*;
    use crate::TokenValue;
    use crate::green::factory;

    fn number(text: &str) -> GreenNode {
        let space = GreenTriviaList::single(GreenTrivia::whitespace(" "));
        let token = GreenToken::literal(
            GreenTriviaList::empty(),
            SyntaxKind::NUMERIC_LITERAL,
            text,
            TokenValue::Integer(text.parse().unwrap()),
            space,
        );
        GreenNode::new(SyntaxKind::NUMERIC_LITERAL_EXPR, [Some(token.into())])
    }

    fn binary(kind: SyntaxKind, left: GreenNode, operator: SyntaxKind, right: GreenNode) -> GreenNode {
        let operator = GreenToken::with_trivia(
            GreenTriviaList::empty(),
            operator,
            GreenTriviaList::single(GreenTrivia::whitespace(" ")),
        );
        GreenNode::new(kind, [Some(left.into()), Some(operator.into()), Some(right.into())])
    }

    /// `1 + 2 * 3`
    fn sum() -> GreenNode {
        let product = binary(SyntaxKind::MULTIPLY_EXPR, number("2"), SyntaxKind::STAR, number("3"));
        binary(SyntaxKind::ADD_EXPR, number("1"), SyntaxKind::PLUS, product)
    }

    struct Identity;

    impl Rewriter for Identity {}

    struct ReplaceNumber {
        from: &'static str,
        to: &'static str,
    }

    impl Rewriter for ReplaceNumber {
        fn rewrite_token(&mut self, token: &GreenToken) -> GreenToken {
            if token.kind() != SyntaxKind::NUMERIC_LITERAL || token.text() != self.from {
                return token.clone();
            }
            GreenToken::literal(
                token.leading_trivia().clone(),
                SyntaxKind::NUMERIC_LITERAL,
                self.to,
                TokenValue::Integer(self.to.parse().unwrap()),
                token.trailing_trivia().clone(),
            )
        }
    }

    #[test]
    fn identity_rewrite_shares_everything() {
        let root = factory::list([sum().into()]);
        let rewritten = Identity.rewrite(&root);
        assert!(rewritten.ptr_eq(&root));
    }

    #[test]
    fn only_the_spine_is_rebuilt() {
        let root = sum();
        let rewritten = ReplaceNumber { from: "2", to: "20" }.rewrite(&root);

        assert_eq!(root.to_string(), "1 + 2 * 3 ");
        assert_eq!(rewritten.to_string(), "1 + 20 * 3 ");
        assert!(!rewritten.ptr_eq(&root));

        let slot = |node: &GreenNode, index: usize| node.slot(index).cloned().unwrap();
        assert!(slot(&rewritten, 0).ptr_eq(&slot(&root, 0)));
        assert!(slot(&rewritten, 1).ptr_eq(&slot(&root, 1)));
        assert!(!slot(&rewritten, 2).ptr_eq(&slot(&root, 2)));

        let old_product = slot(&root, 2).into_node().unwrap();
        let new_product = slot(&rewritten, 2).into_node().unwrap();
        assert!(!slot(&new_product, 0).ptr_eq(&slot(&old_product, 0)));
        assert!(slot(&new_product, 1).ptr_eq(&slot(&old_product, 1)));
        assert!(slot(&new_product, 2).ptr_eq(&slot(&old_product, 2)));
    }

    #[test]
    fn rebuilt_nodes_keep_their_diagnostics() {
        let error = Diagnostic::new(DiagnosticCode::InvalidStatement, TextSize::new(0), TextSize::new(1));
        let root = sum().with_diagnostics(vec![error.clone()]);
        let rewritten = ReplaceNumber { from: "3", to: "4" }.rewrite(&root);
        assert_eq!(&*rewritten.diagnostics(), &[error]);
    }

    #[test]
    #[should_panic(expected = "cannot be rewritten")]
    fn lists_stay_lists() {
        struct Unwrap;

        impl Rewriter for Unwrap {
            fn rewrite_node(&mut self, node: &GreenNode) -> GreenNode {
                if node.kind() == SyntaxKind::LIST {
                    return number("0");
                }
                self.rewrite_children(node)
            }
        }

        let root = GreenNode::new(SyntaxKind::STATEMENT_LIST, [Some(factory::list([]).into())]);
        Unwrap.rewrite(&root);
    }

    #[test]
    fn structured_trivia_is_rewritten_on_request() {
        struct Undefine;

        impl Rewriter for Undefine {
            fn visit_into_structured_trivia(&self) -> bool {
                true
            }

            fn rewrite_token(&mut self, token: &GreenToken) -> GreenToken {
                if token.contextual_kind() == SyntaxKind::DEFINE_KW {
                    return GreenToken::contextual_identifier(
                        token.leading_trivia().clone(),
                        SyntaxKind::UNDEF_KW,
                        "undef",
                        token.trailing_trivia().clone(),
                    );
                }
                let leading = self.rewrite_trivia_list(token.leading_trivia());
                leading.map_or_else(|| token.clone(), |leading| token.with_leading_trivia(leading))
            }
        }

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
                Some(factory::identifier("X").into()),
                Some(GreenToken::new(SyntaxKind::END_OF_DIRECTIVE).into()),
            ],
        );
        let eof = GreenToken::with_trivia(
            GreenTriviaList::single(GreenTrivia::structured(directive)),
            SyntaxKind::EOF,
            GreenTriviaList::empty(),
        );
        let root = factory::list([eof.into()]);

        assert_eq!(Undefine.rewrite(&root).to_string(), "$undef X");
        assert!(Identity.rewrite(&root).ptr_eq(&root));
    }
}
