use crate::NodeOrToken;
use crate::syntax::{SyntaxNode, SyntaxToken, SyntaxTrivia};

/// How deep a [`SyntaxWalker`] goes. Each level includes the previous ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WalkerDepth {
    #[default]
    Nodes,
    Tokens,
    Trivia,
    StructuredTrivia,
}

/// Depth-first walk over a red tree, in source order.
pub trait SyntaxWalker {
    fn depth(&self) -> WalkerDepth {
        WalkerDepth::Nodes
    }

    fn visit_node(&mut self, node: &SyntaxNode) {
        self.walk(node);
    }

    fn visit_token(&mut self, token: &SyntaxToken) {
        if self.depth() < WalkerDepth::Trivia {
            return;
        }
        for trivia in token.leading_trivia() {
            self.visit_trivia(&trivia);
        }
        for trivia in token.trailing_trivia() {
            self.visit_trivia(&trivia);
        }
    }

    fn visit_trivia(&mut self, trivia: &SyntaxTrivia) {
        if self.depth() < WalkerDepth::StructuredTrivia {
            return;
        }
        if let Some(structure) = trivia.structure() {
            self.visit_node(&structure);
        }
    }

    /// Visits the children of `node`, lists flattened.
    fn walk(&mut self, node: &SyntaxNode) {
        let tokens = self.depth() >= WalkerDepth::Tokens;
        for child in node.children_with_tokens() {
            match child {
                NodeOrToken::Node(child) => self.visit_node(&child),
                NodeOrToken::Token(child) if tokens => self.visit_token(&child),
                NodeOrToken::Token(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxKind;
    use crate::green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList, factory};

    struct Recorder {
        depth: WalkerDepth,
        seen: Vec<SyntaxKind>,
    }

    impl SyntaxWalker for Recorder {
        fn depth(&self) -> WalkerDepth {
            self.depth
        }

        fn visit_node(&mut self, node: &SyntaxNode) {
            self.seen.push(node.kind());
            self.walk(node);
        }

        fn visit_token(&mut self, token: &SyntaxToken) {
            self.seen.push(token.kind());
            if self.depth() >= WalkerDepth::Trivia {
                for trivia in token.leading_trivia().chain(token.trailing_trivia()) {
                    self.visit_trivia(&trivia);
                }
            }
        }

        fn visit_trivia(&mut self, trivia: &SyntaxTrivia) {
            self.seen.push(trivia.kind());
            match trivia.structure() {
                Some(structure) if self.depth() >= WalkerDepth::StructuredTrivia => self.visit_node(&structure),
                _ => {}
            }
        }
    }

    fn tree() -> SyntaxNode {
        let directive = GreenNode::new(
            SyntaxKind::END_DIRECTIVE_TRIVIA,
            [
                Some(GreenToken::new(SyntaxKind::DOLLAR).into()),
                Some(GreenToken::new(SyntaxKind::END_KW).into()),
                Some(GreenToken::new(SyntaxKind::END_OF_DIRECTIVE).into()),
            ],
        );
        let semicolon = GreenToken::with_trivia(
            GreenTriviaList::new([GreenTrivia::structured(directive), GreenTrivia::end_of_line("\n")]),
            SyntaxKind::SEMICOLON,
            GreenTriviaList::empty(),
        );
        let statement = GreenNode::new(SyntaxKind::EMPTY_STMT, [Some(semicolon.into())]);
        let statements = GreenNode::new(SyntaxKind::STATEMENT_LIST, [Some(factory::list([statement.into()]).into())]);
        SyntaxNode::new_root(GreenNode::new(
            SyntaxKind::COMPILATION_UNIT,
            [Some(statements.into()), Some(GreenToken::new(SyntaxKind::EOF).into())],
        ))
    }

    fn walk(depth: WalkerDepth) -> Vec<SyntaxKind> {
        let mut recorder = Recorder { depth, seen: Vec::new() };
        recorder.visit_node(&tree());
        recorder.seen
    }

    #[test]
    fn depth_controls_what_is_seen() {
        use SyntaxKind::*;

        assert_eq!(walk(WalkerDepth::Nodes), [COMPILATION_UNIT, STATEMENT_LIST, EMPTY_STMT]);
        assert_eq!(
            walk(WalkerDepth::Tokens),
            [COMPILATION_UNIT, STATEMENT_LIST, EMPTY_STMT, SEMICOLON, EOF]
        );
        assert_eq!(
            walk(WalkerDepth::Trivia),
            [COMPILATION_UNIT, STATEMENT_LIST, EMPTY_STMT, SEMICOLON, END_DIRECTIVE_TRIVIA, END_OF_LINE, EOF]
        );
        assert_eq!(
            walk(WalkerDepth::StructuredTrivia),
            [
                COMPILATION_UNIT,
                STATEMENT_LIST,
                EMPTY_STMT,
                SEMICOLON,
                END_DIRECTIVE_TRIVIA,
                END_DIRECTIVE_TRIVIA,
                DOLLAR,
                END_KW,
                END_OF_DIRECTIVE,
                END_OF_LINE,
                EOF,
            ]
        );
    }

    #[test]
    fn default_hooks_reach_every_level() {
        struct LineBreaks(usize);

        impl SyntaxWalker for LineBreaks {
            fn depth(&self) -> WalkerDepth {
                WalkerDepth::Trivia
            }

            fn visit_trivia(&mut self, trivia: &SyntaxTrivia) {
                self.0 += usize::from(trivia.kind() == SyntaxKind::END_OF_LINE);
            }
        }

        let mut breaks = LineBreaks(0);
        breaks.visit_node(&tree());
        assert_eq!(breaks.0, 1);
    }
}
