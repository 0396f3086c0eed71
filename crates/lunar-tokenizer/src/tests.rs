use std::fmt::Write as _;

use expect_test::{Expect, expect};
use lunar_yellow::{GreenNodeCache, SyntaxKind, SyntaxOptions, TokenValue};
use text_size::TextSize;

use crate::{Token, Tokenizer, tokenize};

fn dump(text: &str, options: &SyntaxOptions) -> String {
    let mut out = String::new();
    for token in tokenize(text, options) {
        for piece in token.green.leading_trivia().pieces() {
            writeln!(out, "  leading {:?} {:?}", piece.kind(), piece.text()).unwrap();
        }
        write!(out, "{:?}@{:?} {:?}", token.kind(), token.text_range(), token.text()).unwrap();
        if token.kind().is_literal_token() {
            write!(out, " = {:?}", token.green.value()).unwrap();
        }
        writeln!(out).unwrap();
        for piece in token.green.trailing_trivia().pieces() {
            writeln!(out, "  trailing {:?} {:?}", piece.kind(), piece.text()).unwrap();
        }
    }
    out
}

fn check(text: &str, options: &SyntaxOptions, expect: Expect) {
    expect.assert_eq(&dump(text, options));
}

fn kinds(text: &str, options: &SyntaxOptions) -> Vec<SyntaxKind> {
    tokenize(text, options).iter().map(Token::kind).collect()
}

fn values(text: &str, options: &SyntaxOptions) -> Vec<TokenValue> {
    tokenize(text, options)
        .iter()
        .filter(|token| token.kind().is_literal_token())
        .map(|token| token.green.value())
        .collect()
}

/// Diagnostics of every token and of the directives in its leading
/// trivia, with absolute ranges.
fn messages(text: &str, options: &SyntaxOptions) -> Vec<String> {
    let mut out = Vec::new();
    for token in tokenize(text, options) {
        let mut offset = token.range.start();
        for piece in token.green.leading_trivia().pieces() {
            if let Some(node) = piece.structure() {
                out.extend(node.diagnostics().iter().map(|diagnostic| {
                    format!("{}@{:?}: {}", diagnostic.severity(), diagnostic.range_at(offset), diagnostic.message())
                }));
            }
            offset += piece.width();
        }
        out.extend(token.green.diagnostics().iter().map(|diagnostic| {
            let range = diagnostic.range_at(token.range.start());
            format!("{}@{range:?}: {}", diagnostic.severity(), diagnostic.message())
        }));
    }
    out
}

#[test]
fn statement() {
    check(
        "local x = 0x10 -- hi\nprint(x)",
        &SyntaxOptions::lua54(),
        expect![[r#"
            LOCAL_KW@0..5 "local"
              trailing WHITESPACE " "
            IDENTIFIER@6..7 "x"
              trailing WHITESPACE " "
            EQ@8..9 "="
              trailing WHITESPACE " "
            NUMERIC_LITERAL@10..14 "0x10" = Integer(16)
              trailing WHITESPACE " "
              trailing SINGLE_LINE_COMMENT "-- hi"
              trailing END_OF_LINE "\n"
            IDENTIFIER@21..26 "print"
            L_PAREN@26..27 "("
            IDENTIFIER@27..28 "x"
            R_PAREN@28..29 ")"
            EOF@29..29 ""
        "#]],
    );
}

#[test]
fn conditional_regions() {
    check(
        "$if DEBUG\nlog()\n$else\nrun()\n$end\n",
        &SyntaxOptions::glua(),
        expect![[r#"
              leading IF_DIRECTIVE_TRIVIA "$if DEBUG"
              leading END_OF_LINE "\n"
              leading DISABLED_TEXT "log()\n"
              leading ELSE_DIRECTIVE_TRIVIA "$else"
              leading END_OF_LINE "\n"
            IDENTIFIER@22..25 "run"
            L_PAREN@25..26 "("
            R_PAREN@26..27 ")"
              trailing END_OF_LINE "\n"
              leading END_DIRECTIVE_TRIVIA "$end"
              leading END_OF_LINE "\n"
            EOF@33..33 ""
        "#]],
    );
}

#[test]
fn full_text_round_trips() {
    let text = "#!/usr/bin/env lua\n--[==[ header ]==]\nlocal s = [[\nraw]] .. 'q\\'' // 2\n\t$x\n";
    for options in [SyntaxOptions::lua51(), SyntaxOptions::lua54(), SyntaxOptions::glua()] {
        let rebuilt: String = tokenize(text, &options).iter().map(|token| token.green.to_string()).collect();
        assert_eq!(rebuilt, text, "{:?}", options.version);
    }
}

#[test]
fn ranges_are_contiguous() {
    let tokens = tokenize("a = { 1, 2 } -- t\n\nreturn a", &SyntaxOptions::lua54());
    let mut end = TextSize::new(0);
    for token in &tokens {
        assert_eq!(token.range.start(), end);
        assert_eq!(token.range.len(), token.green.width());
        end = token.range.end();
    }
    assert_eq!(tokens.last().map(Token::kind), Some(SyntaxKind::EOF));
}

#[test]
fn lookahead_and_end_of_input() {
    let mut cache = GreenNodeCache::new();
    let mut tokenizer = Tokenizer::new("x", &SyntaxOptions::lua54(), &mut cache);
    assert_eq!(tokenizer.peek().kind(), SyntaxKind::IDENTIFIER);
    assert_eq!(tokenizer.next_token().kind(), SyntaxKind::IDENTIFIER);
    assert_eq!(tokenizer.peek().kind(), SyntaxKind::EOF);
    for _ in 0..3 {
        let token = tokenizer.next_token();
        assert_eq!(token.kind(), SyntaxKind::EOF);
        assert!(token.range.is_empty());
    }
}

#[test]
fn numbers() {
    let lua54 = SyntaxOptions::lua54();
    assert_eq!(
        values("3 3.0 0xff 1e2 0x.8p1 9223372036854775808 0xffffffffffffffff", &lua54),
        [
            TokenValue::Integer(3),
            TokenValue::Float(3.0),
            TokenValue::Integer(255),
            TokenValue::Float(100.0),
            TokenValue::Float(1.0),
            TokenValue::Float(9_223_372_036_854_775_808.0),
            TokenValue::Integer(-1),
        ]
    );
    assert!(messages("3 .5 0x1P-2", &lua54).is_empty());
    assert_eq!(
        values("1e+2 25e-1 0x1p-2", &lua54),
        [TokenValue::Float(100.0), TokenValue::Float(2.5), TokenValue::Float(0.25)]
    );
    assert_eq!(
        kinds("2e-1-1", &lua54),
        [SyntaxKind::NUMERIC_LITERAL, SyntaxKind::MINUS, SyntaxKind::NUMERIC_LITERAL, SyntaxKind::EOF]
    );

    let lua51 = SyntaxOptions::lua51();
    assert_eq!(values("0xff 0x1p4", &lua51), [TokenValue::Float(255.0), TokenValue::Float(16.0)]);
    assert_eq!(messages("0xff 0x1p4", &lua51), ["error@5..10: hexadecimal floats is not available in Lua 5.1"]);
}

#[test]
fn malformed_numbers() {
    let options = SyntaxOptions::lua54();
    assert_eq!(kinds("3..2 x", &options), [SyntaxKind::NUMERIC_LITERAL, SyntaxKind::IDENTIFIER, SyntaxKind::EOF]);
    assert_eq!(values("3..2", &options), [TokenValue::None]);
    assert_eq!(messages("3..2 x", &options), ["error@0..4: malformed number `3..2`"]);
    assert_eq!(messages("12abc", &options), ["error@0..5: malformed number `12abc`"]);
}

#[test]
fn escapes() {
    let text = r#""a\tb\65\x41\u{48}\z
        c""#;
    assert_eq!(values(text, &SyntaxOptions::lua54()), [TokenValue::String("a\tbAAHc".into())]);

    let text = r#""\x41\z  b\u{48}""#;
    assert_eq!(values(text, &SyntaxOptions::lua51()), [TokenValue::String("AbH".into())]);
    assert_eq!(
        messages(text, &SyntaxOptions::lua51()),
        [
            "error@1..5: hexadecimal escapes is not available in Lua 5.1",
            "error@5..7: `\\z` escapes is not available in Lua 5.1",
            "error@10..16: unicode escapes is not available in Lua 5.1",
        ]
    );
    assert!(messages(text, &SyntaxOptions::glua()).is_empty());
}

#[test]
fn invalid_escapes_warn() {
    let options = SyntaxOptions::lua54();
    assert_eq!(values(r#""\q""#, &options), [TokenValue::String("q".into())]);
    assert_eq!(messages(r#""\q""#, &options), ["warning@1..3: invalid escape sequence `\\q`"]);
    assert_eq!(messages(r#""\300""#, &options), ["warning@1..5: invalid escape sequence `\\300`"]);
}

#[test]
fn unterminated_strings() {
    let options = SyntaxOptions::lua54();
    assert_eq!(kinds("'abc\nx", &options), [SyntaxKind::STRING_LITERAL, SyntaxKind::IDENTIFIER, SyntaxKind::EOF]);
    assert_eq!(messages("'abc\nx", &options), ["error@0..4: unfinished string"]);
    assert_eq!(messages("[=[ open", &options), ["error@0..8: unfinished long string"]);
}

#[test]
fn long_strings() {
    let options = SyntaxOptions::lua54();
    assert_eq!(values("[==[\nline]]\n]==]", &options), [TokenValue::String("line]]\n".into())]);
    assert_eq!(kinds("t[ [[x]] ]", &options), [
        SyntaxKind::IDENTIFIER,
        SyntaxKind::L_BRACKET,
        SyntaxKind::STRING_LITERAL,
        SyntaxKind::R_BRACKET,
        SyntaxKind::EOF,
    ]);
}

#[test]
fn comments() {
    let options = SyntaxOptions::lua54();
    let tokens = tokenize("--[[ a\nb ]] x --[==[ open", &options);
    let leading: Vec<_> = tokens[0].green.leading_trivia().iter().map(|piece| piece.kind()).collect();
    assert_eq!(leading, [SyntaxKind::MULTI_LINE_COMMENT, SyntaxKind::WHITESPACE]);
    assert_eq!(messages("--[[ a\nb ]] x --[==[ open", &options), ["error@14..25: unfinished long comment"]);
}

#[test]
fn c_style_comments() {
    check(
        "/* c */ a // line\nb",
        &SyntaxOptions::glua(),
        expect![[r#"
              leading MULTI_LINE_COMMENT "/* c */"
              leading WHITESPACE " "
            IDENTIFIER@8..9 "a"
              trailing WHITESPACE " "
              trailing SINGLE_LINE_COMMENT "// line"
              trailing END_OF_LINE "\n"
            IDENTIFIER@18..19 "b"
            EOF@19..19 ""
        "#]],
    );
    assert_eq!(kinds("a // b", &SyntaxOptions::lua54())[1], SyntaxKind::SLASH_SLASH);
}

#[test]
fn shebang_line() {
    let tokens = tokenize("#!/usr/bin/lua\nprint(1)", &SyntaxOptions::lua53());
    let leading: Vec<_> = tokens[0].green.leading_trivia().iter().map(|piece| piece.kind()).collect();
    assert_eq!(leading, [SyntaxKind::SHEBANG, SyntaxKind::END_OF_LINE]);
    assert_eq!(tokens[0].kind(), SyntaxKind::IDENTIFIER);
}

#[test]
fn dialect_punctuation() {
    assert_eq!(messages("a // b", &SyntaxOptions::lua51()), ["error@2..4: floor division is not available in Lua 5.1"]);
    assert!(messages("a // b", &SyntaxOptions::lua53()).is_empty());
    assert_eq!(messages("$x", &SyntaxOptions::lua54()), ["error@0..1: directives is not available in Lua 5.4"]);

    let glua = SyntaxOptions::glua();
    assert_eq!(kinds("a != b && !c continue", &glua), [
        SyntaxKind::IDENTIFIER,
        SyntaxKind::BANG_EQ,
        SyntaxKind::IDENTIFIER,
        SyntaxKind::AMP_AMP,
        SyntaxKind::BANG,
        SyntaxKind::IDENTIFIER,
        SyntaxKind::CONTINUE_KW,
        SyntaxKind::EOF,
    ]);
    assert!(messages("a != b && !c continue", &glua).is_empty());
    assert_eq!(kinds("continue goto", &SyntaxOptions::lua51()), [
        SyntaxKind::IDENTIFIER,
        SyntaxKind::IDENTIFIER,
        SyntaxKind::EOF
    ]);
}

#[test]
fn bad_characters() {
    let options = SyntaxOptions::lua54();
    assert_eq!(kinds("x = @", &options)[2], SyntaxKind::BAD_TOKEN);
    assert_eq!(messages("x = @", &options), ["error@4..5: unexpected character `@`"]);
    assert_eq!(kinds("é", &options)[0], SyntaxKind::BAD_TOKEN);
    assert_eq!(kinds("é", &SyntaxOptions::glua())[0], SyntaxKind::IDENTIFIER);
}

#[test]
fn directive_errors() {
    let glua = SyntaxOptions::glua();
    assert_eq!(
        messages("$iff X\n$else\n", &glua),
        [
            "error@0..6: malformed directive",
            "error@7..12: `$else` without a matching `$if`",
            "error@13..13: `$end` expected",
        ]
    );
    assert_eq!(messages("$if X\n", &glua), ["error@6..6: `$end` expected"]);
    assert_eq!(messages("$end", &glua), ["error@0..4: `$end` without a matching `$if`"]);
}

#[test]
fn defined_symbols_select_branches() {
    let text = "$if X\na\n$end";
    let defined = SyntaxOptions::glua().with_defined_symbols(["X"]);
    assert_eq!(kinds(text, &defined), [SyntaxKind::IDENTIFIER, SyntaxKind::EOF]);
    assert_eq!(kinds(text, &SyntaxOptions::glua()), [SyntaxKind::EOF]);
}

#[test]
fn defines_enable_later_branches() {
    let text = "$define DEBUG -- on\n$if DEBUG\nx\n$end";
    let tokens = tokenize(text, &SyntaxOptions::glua());
    assert_eq!(tokens[0].kind(), SyntaxKind::IDENTIFIER);

    let define = tokens[0].green.leading_trivia().pieces()[0].structure().cloned().unwrap();
    assert_eq!(define.kind(), SyntaxKind::DEFINE_DIRECTIVE_TRIVIA);
    assert_eq!(define.to_string(), "$define DEBUG -- on");
    let name = define.slot(2).and_then(|slot| slot.as_token()).unwrap();
    assert_eq!(name.text(), "DEBUG");
    let end = define.slot(3).and_then(|slot| slot.as_token()).unwrap();
    assert_eq!(end.kind(), SyntaxKind::END_OF_DIRECTIVE);
    assert_eq!(end.leading_trivia().pieces()[0].text(), "-- on");
}
