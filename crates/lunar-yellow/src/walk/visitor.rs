use crate::green::{GreenElement, GreenNode, GreenToken, GreenTrivia};
use crate::{NodeOrToken, SyntaxKind};

/// Read-only traversal of a green tree.
///
/// [`Visitor::visit_node`] dispatches on the kind range; every hook defaults
/// to visiting the children and returning `Output::default()`, so an
/// implementation overrides only the categories it cares about.
pub trait Visitor {
    type Output: Default;

    /// When `false`, directives and skipped tokens are leaves.
    fn visit_into_structured_trivia(&self) -> bool {
        false
    }

    fn visit_node(&mut self, node: &GreenNode) -> Self::Output {
        let kind = node.kind();
        if kind == SyntaxKind::LIST {
            self.visit_list(node)
        } else if kind.is_structured_trivia() {
            self.visit_structured_trivia(node)
        } else if kind.is_name() {
            self.visit_name(node)
        } else if kind.is_expression() {
            self.visit_expression(node)
        } else if kind.is_statement() {
            self.visit_statement(node)
        } else if kind.is_declaration() {
            self.visit_declaration(node)
        } else {
            self.walk_children(node)
        }
    }

    fn visit_list(&mut self, list: &GreenNode) -> Self::Output {
        self.walk_children(list)
    }

    fn visit_name(&mut self, name: &GreenNode) -> Self::Output {
        self.walk_children(name)
    }

    fn visit_expression(&mut self, expression: &GreenNode) -> Self::Output {
        self.walk_children(expression)
    }

    fn visit_statement(&mut self, statement: &GreenNode) -> Self::Output {
        self.walk_children(statement)
    }

    fn visit_declaration(&mut self, declaration: &GreenNode) -> Self::Output {
        self.walk_children(declaration)
    }

    fn visit_structured_trivia(&mut self, structure: &GreenNode) -> Self::Output {
        self.walk_children(structure)
    }

    /// Visits the token's trivia, leading first.
    fn visit_token(&mut self, token: &GreenToken) -> Self::Output {
        for piece in token.leading_trivia().iter().chain(token.trailing_trivia()) {
            self.visit_trivia(piece);
        }
        Self::Output::default()
    }

    fn visit_trivia(&mut self, trivia: &GreenTrivia) -> Self::Output {
        match trivia.structure() {
            Some(structure) if self.visit_into_structured_trivia() => self.visit_node(structure),
            _ => Self::Output::default(),
        }
    }

    fn visit_element(&mut self, element: &GreenElement) -> Self::Output {
        match element {
            NodeOrToken::Node(node) => self.visit_node(node),
            NodeOrToken::Token(token) => self.visit_token(token),
        }
    }

    fn walk_children(&mut self, node: &GreenNode) -> Self::Output {
        for child in node.children() {
            self.visit_element(child);
        }
        Self::Output::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::{GreenTriviaList, factory};

    #[derive(Default)]
    struct Census {
        expressions: Vec<SyntaxKind>,
        comments: usize,
        directives: usize,
        structured: bool,
    }

    impl Visitor for Census {
        type Output = ();

        fn visit_into_structured_trivia(&self) -> bool {
            self.structured
        }

        fn visit_expression(&mut self, expression: &GreenNode) {
            self.expressions.push(expression.kind());
            self.walk_children(expression);
        }

        fn visit_structured_trivia(&mut self, structure: &GreenNode) {
            self.directives += usize::from(structure.kind().is_directive_trivia());
            self.walk_children(structure);
        }

        fn visit_trivia(&mut self, trivia: &GreenTrivia) {
            self.comments += usize::from(trivia.is_comment());
            match trivia.structure() {
                Some(structure) if self.visit_into_structured_trivia() => self.visit_node(structure),
                _ => {}
            }
        }
    }

    fn tree() -> GreenNode {
        let literal = |text: &str| {
            let token = GreenToken::literal(
                GreenTriviaList::empty(),
                SyntaxKind::NUMERIC_LITERAL,
                text,
                crate::TokenValue::None,
                GreenTriviaList::single(GreenTrivia::comment("-- note")),
            );
            GreenNode::new(SyntaxKind::NUMERIC_LITERAL_EXPR, [Some(token.into())])
        };
        let directive = GreenNode::new(
            SyntaxKind::ELSE_DIRECTIVE_TRIVIA,
            [
                Some(GreenToken::new(SyntaxKind::DOLLAR).into()),
                Some(GreenToken::new(SyntaxKind::ELSE_KW).into()),
                Some(GreenToken::new(SyntaxKind::END_OF_DIRECTIVE).into()),
            ],
        );
        let plus = GreenToken::with_trivia(
            GreenTriviaList::single(GreenTrivia::structured(directive)),
            SyntaxKind::PLUS,
            GreenTriviaList::empty(),
        );
        let sum = GreenNode::new(
            SyntaxKind::ADD_EXPR,
            [Some(literal("1").into()), Some(plus.into()), Some(literal("2").into())],
        );
        factory::list([GreenNode::new(SyntaxKind::EXPRESSION_STMT, [Some(sum.into())]).into()])
    }

    #[test]
    fn dispatches_by_category() {
        let mut census = Census::default();
        census.visit_node(&tree());
        assert_eq!(
            census.expressions,
            [SyntaxKind::ADD_EXPR, SyntaxKind::NUMERIC_LITERAL_EXPR, SyntaxKind::NUMERIC_LITERAL_EXPR]
        );
        assert_eq!(census.comments, 2);
        assert_eq!(census.directives, 0);
    }

    #[test]
    fn structured_trivia_opt_in() {
        let mut census = Census { structured: true, ..Census::default() };
        census.visit_node(&tree());
        assert_eq!(census.directives, 1);
    }

    #[test]
    fn outputs_fold() {
        struct Width;

        impl Visitor for Width {
            type Output = u32;

            fn visit_node(&mut self, node: &GreenNode) -> u32 {
                node.children().map(|child| self.visit_element(child)).sum()
            }

            fn visit_token(&mut self, token: &GreenToken) -> u32 {
                token.width().into()
            }
        }

        let root = tree();
        assert_eq!(Width.visit_node(&root), u32::from(root.width()));
    }
}
