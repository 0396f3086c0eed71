use expect_test::expect;
use lunar_errors::{Diagnostic, DiagnosticCode};
use text_size::{TextRange, TextSize};

use super::*;
use crate::green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList, factory};
use crate::{SyntaxKind, TokenAtOffset, TokenValue};

fn space() -> GreenTriviaList {
    GreenTriviaList::single(GreenTrivia::whitespace(" "))
}

fn name(text: &str, trailing: GreenTriviaList) -> GreenNode {
    let token = GreenToken::identifier(GreenTriviaList::empty(), text, trailing);
    GreenNode::new(SyntaxKind::IDENTIFIER_NAME, [Some(token.into())])
}

fn if_directive(symbol: &str) -> GreenNode {
    GreenNode::new(
        SyntaxKind::IF_DIRECTIVE_TRIVIA,
        [
            Some(GreenToken::new(SyntaxKind::DOLLAR).into()),
            Some(GreenToken::with_trivia(GreenTriviaList::empty(), SyntaxKind::IF_KW, space()).into()),
            Some(factory::identifier(symbol).into()),
            Some(GreenToken::new(SyntaxKind::END_OF_DIRECTIVE).into()),
        ],
    )
}

/// `local x = 1\n$if A\nreturn x`
fn green_tree() -> GreenNode {
    let local = GreenNode::new(
        SyntaxKind::LOCAL_VARIABLE_DECLARATION_STMT,
        [
            Some(GreenToken::with_trivia(GreenTriviaList::empty(), SyntaxKind::LOCAL_KW, space()).into()),
            Some(
                factory::list([GreenNode::new(
                    SyntaxKind::LOCAL_VARIABLE_NAME,
                    [Some(name("x", space()).into()), None],
                )
                .into()])
                .into(),
            ),
            Some(
                GreenNode::new(
                    SyntaxKind::EQUALS_VALUES_CLAUSE,
                    [
                        Some(GreenToken::with_trivia(GreenTriviaList::empty(), SyntaxKind::EQ, space()).into()),
                        Some(
                            factory::list([GreenNode::new(
                                SyntaxKind::NUMERIC_LITERAL_EXPR,
                                [Some(
                                    GreenToken::literal(
                                        GreenTriviaList::empty(),
                                        SyntaxKind::NUMERIC_LITERAL,
                                        "1",
                                        TokenValue::Integer(1),
                                        GreenTriviaList::single(GreenTrivia::end_of_line("\n")),
                                    )
                                    .into(),
                                )],
                            )
                            .into()])
                            .into(),
                        ),
                    ],
                )
                .into(),
            ),
            None,
        ],
    );

    let return_kw = GreenToken::with_trivia(
        GreenTriviaList::new([GreenTrivia::structured(if_directive("A")), GreenTrivia::end_of_line("\n")]),
        SyntaxKind::RETURN_KW,
        space(),
    );
    let ret = GreenNode::new(
        SyntaxKind::RETURN_STMT,
        [
            Some(return_kw.into()),
            Some(factory::list([name("x", GreenTriviaList::empty()).into()]).into()),
            None,
        ],
    );

    let statements =
        GreenNode::new(SyntaxKind::STATEMENT_LIST, [Some(factory::list([local.into(), ret.into()]).into())]);
    GreenNode::new(
        SyntaxKind::COMPILATION_UNIT,
        [Some(statements.into()), Some(GreenToken::new(SyntaxKind::EOF).into())],
    )
}

fn tree() -> SyntaxNode {
    SyntaxNode::new_root(green_tree())
}

#[test]
fn text_round_trips_and_widths_add_up() {
    let root = tree();
    assert_eq!(root.text(), "local x = 1\n$if A\nreturn x");
    assert_eq!(root.text_range(), TextRange::new(0.into(), 26.into()));

    for node in root.descendants() {
        let children: TextSize = node.slots().map(|child| child.text_range().len()).sum();
        assert_eq!(children, node.text_range().len(), "{node:?}");
    }

    let tokens: String = root
        .descendants_with_tokens()
        .filter_map(NodeOrToken::into_token)
        .map(|token| token.to_string())
        .collect();
    assert_eq!(tokens, root.text());
}

#[test]
fn parents_look_through_lists() {
    let root = tree();
    let statements = root.first_child_by_kind(SyntaxKind::STATEMENT_LIST).unwrap();
    let kinds: Vec<_> = statements.children().map(|node| node.kind()).collect();
    assert_eq!(kinds, [SyntaxKind::LOCAL_VARIABLE_DECLARATION_STMT, SyntaxKind::RETURN_STMT]);

    let ret = statements.children().nth(1).unwrap();
    assert_eq!(ret.parent(), Some(statements.clone()));
    let ancestors: Vec<_> = ret.ancestors().map(|node| node.kind()).collect();
    assert_eq!(ancestors, [SyntaxKind::RETURN_STMT, SyntaxKind::STATEMENT_LIST, SyntaxKind::COMPILATION_UNIT]);

    match ret.slot(1) {
        Some(NodeOrToken::Node(list)) => {
            assert_eq!(list.kind(), SyntaxKind::LIST);
            assert_eq!(list.text_range(), TextRange::new(25.into(), 26.into()));
        }
        other => panic!("unexpected slot {other:?}"),
    }
    assert!(ret.slot(2).is_none());
}

#[test]
#[should_panic(expected = "out of range")]
fn slots_past_arity_panic() {
    tree().slot(5);
}

#[test]
fn token_navigation() {
    let root = tree();
    let first = root.first_token().unwrap();
    assert_eq!(first.kind(), SyntaxKind::LOCAL_KW);
    assert_eq!(root.last_token().unwrap().kind(), SyntaxKind::EOF);

    let mut kinds = vec![first.kind()];
    let mut token = first;
    while let Some(next) = token.next_token() {
        kinds.push(next.kind());
        token = next;
    }
    assert_eq!(
        kinds,
        [
            SyntaxKind::LOCAL_KW,
            SyntaxKind::IDENTIFIER,
            SyntaxKind::EQ,
            SyntaxKind::NUMERIC_LITERAL,
            SyntaxKind::RETURN_KW,
            SyntaxKind::IDENTIFIER,
            SyntaxKind::EOF,
        ]
    );

    let back = token.prev_token().and_then(|token| token.prev_token()).unwrap();
    assert_eq!(back.kind(), SyntaxKind::RETURN_KW);
    assert_eq!(back.span(), TextRange::new(18.into(), 24.into()));
    assert_eq!(back.text_range(), TextRange::new(12.into(), 25.into()));
}

#[test]
fn find_token_by_offset() {
    let root = tree();
    let at = |offset: u32, inside: bool| root.find_token(offset.into(), inside).map(|token| token.kind());

    assert_eq!(at(0, false), Some(SyntaxKind::LOCAL_KW));
    assert_eq!(at(7, false), Some(SyntaxKind::IDENTIFIER));
    assert_eq!(at(14, false), Some(SyntaxKind::RETURN_KW));
    assert_eq!(at(14, true), Some(SyntaxKind::IF_KW));
    assert_eq!(at(16, true), Some(SyntaxKind::IDENTIFIER));
    assert_eq!(at(26, false), Some(SyntaxKind::IDENTIFIER));
    assert_eq!(at(27, false), None);
}

#[test]
fn tokens_touching_an_offset() {
    let root = tree();
    match root.token_at_offset(6.into()) {
        TokenAtOffset::Between(left, right) => {
            assert_eq!(left.kind(), SyntaxKind::LOCAL_KW);
            assert_eq!(right.kind(), SyntaxKind::IDENTIFIER);
        }
        other => panic!("expected two tokens, got {other:?}"),
    }
    assert!(matches!(root.token_at_offset(1.into()), TokenAtOffset::Single(_)));
    assert_eq!(root.token_at_offset(0.into()).right_biased().map(|t| t.kind()), Some(SyntaxKind::LOCAL_KW));
}

#[test]
fn covering_elements() {
    let root = tree();
    let element = root.covering_element(TextRange::new(6.into(), 7.into()));
    assert_eq!(element.kind(), SyntaxKind::IDENTIFIER);

    let element = root.covering_element(TextRange::new(6.into(), 11.into()));
    assert_eq!(element.kind(), SyntaxKind::LOCAL_VARIABLE_DECLARATION_STMT);

    let element = root.covering_element(TextRange::new(0.into(), 26.into()));
    assert_eq!(element.kind(), SyntaxKind::STATEMENT_LIST);
}

#[test]
fn structured_trivia_facades_are_cached() {
    let root = tree();
    let ret = root.descendants().find(|node| node.kind() == SyntaxKind::RETURN_STMT).unwrap();
    let token = ret.first_token().unwrap();
    let trivia = token.leading_trivia().next().unwrap();
    assert!(trivia.has_structure());

    let first = trivia.structure().unwrap();
    let second = token.leading_trivia().next().unwrap().structure().unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(first.kind(), SyntaxKind::IF_DIRECTIVE_TRIVIA);
    assert_eq!(first.text_range(), TextRange::new(12.into(), 17.into()));
    assert_eq!(first.parent(), None);
    assert_eq!(first.structured_trivia(), Some(&trivia));

    let symbol = first.slot(2).and_then(NodeOrToken::into_token).unwrap();
    assert_eq!(symbol.text(), "A");
    assert_eq!(symbol.span(), TextRange::new(16.into(), 17.into()));

    drop((first, second));
    let rebuilt = trivia.structure().unwrap();
    assert_eq!(rebuilt.green().kind(), SyntaxKind::IF_DIRECTIVE_TRIVIA);
}

#[test]
fn detached_trivia_builds_fresh_facades() {
    let token = GreenToken::with_trivia(
        GreenTriviaList::single(GreenTrivia::structured(if_directive("B"))),
        SyntaxKind::EOF,
        GreenTriviaList::empty(),
    );
    let token = SyntaxToken::detached(token);
    let trivia = token.leading_trivia().next().unwrap();

    let first = trivia.structure().unwrap();
    let second = trivia.structure().unwrap();
    assert!(!first.ptr_eq(&second));
    assert_eq!(first, second);
    assert_eq!(first.text(), "$if B");
}

#[test]
fn structures_can_be_shared_across_threads() {
    let root = tree();
    let token = root.find_token(18.into(), false).unwrap();
    let facades: Vec<SyntaxNode> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let token = token.clone();
                scope.spawn(move || token.leading_trivia().next().and_then(|trivia| trivia.structure()))
            })
            .collect();
        handles.into_iter().filter_map(|handle| handle.join().ok().flatten()).collect()
    });
    assert_eq!(facades.len(), 4);
    assert!(facades.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn node_pointers_resolve() {
    let root = tree();
    for node in root.descendants() {
        let ptr = SyntaxNodePtr::new(&node);
        assert_eq!(ptr.to_node(&root), node, "{ptr:?}");
    }

    let nested = root.descendants().nth(2).unwrap();
    assert_eq!(SyntaxNodePtr::new(&root).try_to_node(&nested), None);
}

#[test]
fn diagnostics_have_absolute_ranges() {
    let error = Diagnostic::new(DiagnosticCode::UnexpectedToken, TextSize::new(0), TextSize::new(6));
    let green = green_tree();
    let child = |node: &GreenNode, index| node.slot(index).and_then(|slot| slot.as_node()).cloned().unwrap();
    let statements = child(&green, 0);
    let list = child(&statements, 0);
    let ret = child(&list, 1);
    let ret = ret.with_diagnostics(vec![error]);
    let list = list.replace_slot(1, Some(ret.into()));
    let statements = statements.replace_slot(0, Some(list.into()));
    let root = SyntaxNode::new_root(green.replace_slot(0, Some(statements.into())));

    let diagnostics = root.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].range(), TextRange::new(12.into(), 18.into()));
    assert!(tree().diagnostics().is_empty());
}

#[test]
fn equality_is_by_identity_and_position() {
    let green = green_tree();
    let left = SyntaxNode::new_root(green.clone());
    let right = SyntaxNode::new_root(green);
    assert_eq!(left, right);
    assert_ne!(left, tree());
}

#[test]
fn dump() {
    expect![[r#"
        COMPILATION_UNIT@0..26
          STATEMENT_LIST@0..26
            LOCAL_VARIABLE_DECLARATION_STMT@0..12
              LOCAL_KW@0..5 "local"
              WHITESPACE@5..6 " "
              LOCAL_VARIABLE_NAME@6..8
                IDENTIFIER_NAME@6..8
                  IDENTIFIER@6..7 "x"
                  WHITESPACE@7..8 " "
              EQUALS_VALUES_CLAUSE@8..12
                EQ@8..9 "="
                WHITESPACE@9..10 " "
                NUMERIC_LITERAL_EXPR@10..12
                  NUMERIC_LITERAL@10..11 "1"
                  END_OF_LINE@11..12 "\n"
            RETURN_STMT@12..26
              IF_DIRECTIVE_TRIVIA@12..17 "$if A"
              END_OF_LINE@17..18 "\n"
              RETURN_KW@18..24 "return"
              WHITESPACE@24..25 " "
              IDENTIFIER_NAME@25..26
                IDENTIFIER@25..26 "x"
          EOF@26..26
    "#]]
    .assert_eq(&tree().debug_dump());
}
