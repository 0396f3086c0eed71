use lunar_errors::DiagnosticCode;
use lunar_yellow::SyntaxKind::{self, *};
use lunar_yellow::SyntaxSet;
use lunar_yellow::facts::{self, Feature};

use super::exprs::{self, at_expr_start, expr};
use super::{BLOCK_FOLLOW, comma_separated, empty_list, expression_list, function_body, name};
use crate::parser::Parser;

/// Statements up to end of file or one of `terminators`. Tokens that cannot
/// start a statement are skipped.
pub(crate) fn block(p: &mut Parser, terminators: SyntaxSet) {
    let m = p.start();
    let list = p.start();
    while !p.at(EOF) && !p.at_any(terminators) {
        if !stmt(p) {
            p.skip();
        }
    }
    list.complete(p, LIST);
    m.complete(p, STATEMENT_LIST);
}

/// Returns `false`, consuming nothing, when no statement starts here.
fn stmt(p: &mut Parser) -> bool {
    match p.peek_kind() {
        SEMICOLON => {
            let m = p.start();
            p.require(Feature::EmptyStatements);
            p.advance();
            m.complete(p, EMPTY_STMT);
        }
        LOCAL_KW => local(p),
        FUNCTION_KW => function_declaration(p),
        DO_KW => {
            let m = p.start();
            p.advance();
            block(p, BLOCK_FOLLOW);
            p.expect(END_KW);
            p.optional(SEMICOLON);
            m.complete(p, DO_STMT);
        }
        WHILE_KW => {
            let m = p.start();
            p.advance();
            expr(p);
            p.expect(DO_KW);
            block(p, BLOCK_FOLLOW);
            p.expect(END_KW);
            p.optional(SEMICOLON);
            m.complete(p, WHILE_STMT);
        }
        REPEAT_KW => {
            let m = p.start();
            p.advance();
            block(p, BLOCK_FOLLOW);
            p.expect(UNTIL_KW);
            expr(p);
            p.optional(SEMICOLON);
            m.complete(p, REPEAT_UNTIL_STMT);
        }
        IF_KW => if_stmt(p),
        FOR_KW => for_stmt(p),
        RETURN_KW => {
            let m = p.start();
            p.advance();
            if at_expr_start(p) {
                expression_list(p);
            } else {
                empty_list(p);
            }
            p.optional(SEMICOLON);
            m.complete(p, RETURN_STMT);
        }
        BREAK_KW => keyword_stmt(p, BREAK_STMT),
        CONTINUE_KW => keyword_stmt(p, CONTINUE_STMT),
        GOTO_KW => {
            let m = p.start();
            p.advance();
            name(p);
            p.optional(SEMICOLON);
            m.complete(p, GOTO_STMT);
        }
        COLON_COLON => {
            let m = p.start();
            p.advance();
            name(p);
            p.expect(COLON_COLON);
            p.optional(SEMICOLON);
            m.complete(p, GOTO_LABEL_STMT);
        }
        _ if at_expr_start(p) => expr_stmt(p),
        _ => return false,
    }
    true
}

fn keyword_stmt(p: &mut Parser, kind: SyntaxKind) {
    let m = p.start();
    p.advance();
    p.optional(SEMICOLON);
    m.complete(p, kind);
}

fn local(p: &mut Parser) {
    let m = p.start();
    p.advance();

    if p.eat(FUNCTION_KW) {
        name(p);
        function_body(p);
        p.optional(SEMICOLON);
        m.complete(p, LOCAL_FUNCTION_DECLARATION_STMT);
        return;
    }

    comma_separated(p, local_variable_name);
    if p.at(EQ) {
        equals_values(p);
    } else {
        p.absent();
    }
    p.optional(SEMICOLON);
    m.complete(p, LOCAL_VARIABLE_DECLARATION_STMT);
}

fn local_variable_name(p: &mut Parser) {
    let m = p.start();
    name(p);
    if p.at(LT) {
        attribute(p);
    } else {
        p.absent();
    }
    m.complete(p, LOCAL_VARIABLE_NAME);
}

fn attribute(p: &mut Parser) {
    let m = p.start();
    p.require(Feature::LocalAttributes);
    p.advance();

    if p.at(IDENTIFIER) {
        match facts::text_to_kind(p.peek_text()) {
            Some(kind @ (CONST_KW | CLOSE_KW)) => p.advance_contextual(kind),
            _ => {
                let text = p.peek_text().to_owned();
                p.error(DiagnosticCode::InvalidAttribute, &[text.as_str()]);
                p.advance();
            }
        }
    } else {
        p.expect(IDENTIFIER);
    }

    p.expect(GT);
    m.complete(p, VARIABLE_ATTRIBUTE);
}

fn equals_values(p: &mut Parser) {
    let m = p.start();
    if p.expect(EQ) {
        expression_list(p);
    } else {
        empty_list(p);
    }
    m.complete(p, EQUALS_VALUES_CLAUSE);
}

fn function_declaration(p: &mut Parser) {
    let m = p.start();
    p.advance();

    let base = p.start();
    name(p);
    let mut function_name = base.complete(p, SIMPLE_FUNCTION_NAME);
    while p.at(DOT) {
        let m = function_name.precede(p);
        p.advance();
        name(p);
        function_name = m.complete(p, MEMBER_FUNCTION_NAME);
    }
    if p.at(COLON) {
        let m = function_name.precede(p);
        p.advance();
        name(p);
        m.complete(p, METHOD_FUNCTION_NAME);
    }

    function_body(p);
    p.optional(SEMICOLON);
    m.complete(p, FUNCTION_DECLARATION_STMT);
}

fn if_stmt(p: &mut Parser) {
    let m = p.start();
    p.advance();
    expr(p);
    p.expect(THEN_KW);
    block(p, BLOCK_FOLLOW);

    let clauses = p.start();
    while p.at(ELSEIF_KW) {
        let clause = p.start();
        p.advance();
        expr(p);
        p.expect(THEN_KW);
        block(p, BLOCK_FOLLOW);
        clause.complete(p, ELSEIF_CLAUSE);
    }
    clauses.complete(p, LIST);

    if p.at(ELSE_KW) {
        let clause = p.start();
        p.advance();
        block(p, BLOCK_FOLLOW);
        clause.complete(p, ELSE_CLAUSE);
    } else {
        p.absent();
    }

    p.expect(END_KW);
    p.optional(SEMICOLON);
    m.complete(p, IF_STMT);
}

fn for_stmt(p: &mut Parser) {
    let m = p.start();
    p.advance();
    let first = name(p);

    let kind = if p.eat(EQ) {
        expr(p);
        p.expect(COMMA);
        expr(p);
        if p.eat(COMMA) {
            expr(p);
        } else {
            p.absent();
            p.absent();
        }
        NUMERIC_FOR_STMT
    } else {
        let names = first.precede(p);
        while p.eat(COMMA) {
            name(p);
        }
        names.complete(p, LIST);
        p.expect(IN_KW);
        expression_list(p);
        GENERIC_FOR_STMT
    };

    p.expect(DO_KW);
    block(p, BLOCK_FOLLOW);
    p.expect(END_KW);
    p.optional(SEMICOLON);
    m.complete(p, kind);
}

/// A function call, or the targets of an assignment.
fn expr_stmt(p: &mut Parser) {
    let first = expr(p);

    if p.at(EQ) || p.at(COMMA) {
        let targets = first.precede(p);
        while p.eat(COMMA) {
            exprs::suffixed_expr(p);
        }
        let targets = targets.complete(p, LIST);
        let m = targets.precede(p);
        equals_values(p);
        p.optional(SEMICOLON);
        m.complete(p, ASSIGNMENT_STMT);
        return;
    }

    let is_call = matches!(first.kind(), FUNCTION_CALL_EXPR | METHOD_CALL_EXPR);
    let m = first.precede(p);
    if !is_call {
        p.error(DiagnosticCode::InvalidStatement, &[]);
    }
    p.optional(SEMICOLON);
    m.complete(p, EXPRESSION_STMT);
}
