use lunar_errors::DiagnosticCode;
use lunar_yellow::SyntaxKind::{self, *};
use lunar_yellow::facts;

use super::{empty_list, expression_list, function_body, name};
use crate::parser::{CompletedMarker, Parser};

pub(crate) fn expr(p: &mut Parser) -> CompletedMarker {
    sub_expr(p, 0)
}

/// Whether the lookahead token can begin an expression.
pub(crate) fn at_expr_start(p: &Parser) -> bool {
    match p.peek_kind() {
        NIL_KW | TRUE_KW | FALSE_KW | NUMERIC_LITERAL | STRING_LITERAL | DOT_DOT_DOT | L_BRACE | FUNCTION_KW
        | IDENTIFIER | L_PAREN => true,
        kind => facts::get_unary_expression_in_any_version(kind).is_some(),
    }
}

/// Operator-precedence loop: binds every binary operator tighter than
/// `limit`. Operators are accepted in any dialect; the tokenizer already
/// flagged the ones the dialect lacks.
fn sub_expr(p: &mut Parser, limit: u8) -> CompletedMarker {
    let mut lhs = match facts::get_unary_expression_in_any_version(p.peek_kind()) {
        Some(kind) => {
            let m = p.start();
            p.advance();
            sub_expr(p, facts::UNARY_PRECEDENCE);
            m.complete(p, kind)
        }
        None => simple_expr(p),
    };

    while let Some(kind) = facts::get_binary_expression_in_any_version(p.peek_kind()) {
        let precedence = facts::expression_precedence(kind);
        if precedence <= limit {
            break;
        }

        let m = lhs.precede(p);
        p.advance();
        let right_limit = if facts::is_right_associative(kind) { precedence - 1 } else { precedence };
        sub_expr(p, right_limit);
        lhs = m.complete(p, kind);
    }

    lhs
}

fn simple_expr(p: &mut Parser) -> CompletedMarker {
    match p.peek_kind() {
        NIL_KW => literal(p, NIL_LITERAL_EXPR),
        TRUE_KW => literal(p, TRUE_LITERAL_EXPR),
        FALSE_KW => literal(p, FALSE_LITERAL_EXPR),
        NUMERIC_LITERAL => literal(p, NUMERIC_LITERAL_EXPR),
        STRING_LITERAL => literal(p, STRING_LITERAL_EXPR),
        DOT_DOT_DOT => literal(p, VARARG_EXPR),
        L_BRACE => table_constructor(p),
        FUNCTION_KW => {
            let m = p.start();
            p.advance();
            function_body(p);
            m.complete(p, ANONYMOUS_FUNCTION_EXPR)
        }
        _ => suffixed_expr(p),
    }
}

fn literal(p: &mut Parser, kind: SyntaxKind) -> CompletedMarker {
    let m = p.start();
    p.advance();
    m.complete(p, kind)
}

/// A name or parenthesized expression followed by any number of field
/// accesses and calls.
pub(crate) fn suffixed_expr(p: &mut Parser) -> CompletedMarker {
    let mut lhs = primary_expr(p);
    loop {
        lhs = match p.peek_kind() {
            DOT => {
                let m = lhs.precede(p);
                p.advance();
                name(p);
                m.complete(p, MEMBER_ACCESS_EXPR)
            }
            L_BRACKET => {
                let m = lhs.precede(p);
                p.advance();
                expr(p);
                p.expect(R_BRACKET);
                m.complete(p, ELEMENT_ACCESS_EXPR)
            }
            COLON => {
                let m = lhs.precede(p);
                p.advance();
                name(p);
                function_argument(p);
                m.complete(p, METHOD_CALL_EXPR)
            }
            L_PAREN | STRING_LITERAL | L_BRACE => {
                let m = lhs.precede(p);
                function_argument(p);
                m.complete(p, FUNCTION_CALL_EXPR)
            }
            _ => return lhs,
        };
    }
}

fn primary_expr(p: &mut Parser) -> CompletedMarker {
    match p.peek_kind() {
        IDENTIFIER => name(p),
        L_PAREN => {
            let m = p.start();
            p.advance();
            expr(p);
            p.expect(R_PAREN);
            m.complete(p, PARENTHESIZED_EXPR)
        }
        _ => {
            let m = p.start();
            p.missing(IDENTIFIER, DiagnosticCode::ExpectedExpression, &[]);
            m.complete(p, IDENTIFIER_NAME)
        }
    }
}

fn function_argument(p: &mut Parser) {
    let m = p.start();
    match p.peek_kind() {
        STRING_LITERAL => {
            literal(p, STRING_LITERAL_EXPR);
            m.complete(p, STRING_FUNCTION_ARGUMENT);
        }
        L_BRACE => {
            table_constructor(p);
            m.complete(p, TABLE_CONSTRUCTOR_FUNCTION_ARGUMENT);
        }
        _ => {
            let open = p.expect(L_PAREN);
            if open && !p.at(R_PAREN) {
                expression_list(p);
            } else {
                empty_list(p);
            }
            p.expect(R_PAREN);
            m.complete(p, EXPRESSION_LIST_FUNCTION_ARGUMENT);
        }
    }
}

fn table_constructor(p: &mut Parser) -> CompletedMarker {
    let m = p.start();
    p.expect(L_BRACE);

    let fields = p.start();
    while !p.at(R_BRACE) && !p.at(EOF) {
        table_field(p);
        if !(p.eat(COMMA) || p.eat(SEMICOLON)) {
            break;
        }
    }
    fields.complete(p, LIST);

    p.expect(R_BRACE);
    m.complete(p, TABLE_CONSTRUCTOR_EXPR)
}

fn table_field(p: &mut Parser) {
    if p.at(L_BRACKET) {
        let m = p.start();
        p.advance();
        expr(p);
        p.expect(R_BRACKET);
        p.expect(EQ);
        expr(p);
        m.complete(p, EXPRESSION_KEYED_TABLE_FIELD);
        return;
    }

    let value = expr(p);
    if value.kind() == IDENTIFIER_NAME && p.at(EQ) {
        let m = value.precede(p);
        p.advance();
        expr(p);
        m.complete(p, IDENTIFIER_KEYED_TABLE_FIELD);
    } else {
        value.precede(p).complete(p, UNKEYED_TABLE_FIELD);
    }
}
