use lunar_yellow::SyntaxKind::*;
use lunar_yellow::SyntaxSet;

use crate::parser::{CompletedMarker, Parser};

mod exprs;
mod stmts;

/// Tokens that close a block.
const BLOCK_FOLLOW: SyntaxSet = SyntaxSet::new([END_KW, ELSE_KW, ELSEIF_KW, UNTIL_KW, EOF]);

pub(crate) fn compilation_unit(p: &mut Parser) {
    let m = p.start();
    stmts::block(p, SyntaxSet::EMPTY);
    p.expect(EOF);
    m.complete(p, COMPILATION_UNIT);
}

pub(crate) fn name(p: &mut Parser) -> CompletedMarker {
    let m = p.start();
    p.expect(IDENTIFIER);
    m.complete(p, IDENTIFIER_NAME)
}

/// One or more `element`s separated by commas, wrapped in a list.
fn comma_separated(p: &mut Parser, mut element: impl FnMut(&mut Parser<'_>)) {
    let m = p.start();
    loop {
        element(p);
        if !p.eat(COMMA) {
            break;
        }
    }
    m.complete(p, LIST);
}

fn expression_list(p: &mut Parser) {
    comma_separated(p, |p| {
        exprs::expr(p);
    });
}

/// An empty list, which leaves its slot empty.
fn empty_list(p: &mut Parser) {
    let m = p.start();
    m.complete(p, LIST);
}

/// Parameters, body and `end` shared by every function form.
fn function_body(p: &mut Parser) {
    parameter_list(p);
    stmts::block(p, BLOCK_FOLLOW);
    p.expect(END_KW);
}

fn parameter_list(p: &mut Parser) {
    let m = p.start();
    let open = p.expect(L_PAREN);

    if open && !p.at(R_PAREN) {
        let list = p.start();
        loop {
            let parameter = p.start();
            if p.eat(DOT_DOT_DOT) {
                parameter.complete(p, VARARG_PARAMETER);
                break;
            }
            name(p);
            parameter.complete(p, NAMED_PARAMETER);
            if !p.eat(COMMA) {
                break;
            }
        }
        list.complete(p, LIST);
    } else {
        empty_list(p);
    }

    p.expect(R_PAREN);
    m.complete(p, PARAMETER_LIST);
}
