use lunar_errors::{Diagnostic, DiagnosticCode};
use lunar_yellow::facts;
use lunar_yellow::{GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList, SyntaxKind, TokenValue};
use text_size::{TextRange, TextSize};

use crate::Tokenizer;

fn is_inline_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0b' | '\x0c')
}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

impl<'t> Tokenizer<'t> {
    pub(crate) fn leading_trivia(&mut self) -> GreenTriviaList {
        let mut pieces = Vec::new();
        loop {
            if self.at_line_start
                && !self.directives.is_active()
                && let Some(disabled) = self.disabled_text()
            {
                pieces.push(disabled);
                continue;
            }

            let piece = match self.cursor.peek() {
                c if is_inline_space(c) => self.whitespace(),
                '\n' | '\r' => self.end_of_line(),
                '-' if self.cursor.second() == '-' => self.lua_comment(),
                '/' if self.accepts_c_comments && matches!(self.cursor.second(), '/' | '*') => self.c_comment(),
                '#' if self.accepts_shebang
                    && self.cursor.offset() == TextSize::new(0)
                    && self.cursor.second() == '!' =>
                {
                    self.shebang()
                }
                '$' if self.accepts_directives && self.at_line_start => self.directive(),
                _ => break,
            };
            pieces.push(piece);
        }
        self.cache.trivia_list(pieces)
    }

    /// Trivia after a token, through the first line break.
    pub(crate) fn trailing_trivia(&mut self) -> GreenTriviaList {
        let mut pieces = Vec::new();
        loop {
            let piece = match self.cursor.peek() {
                c if is_inline_space(c) => self.whitespace(),
                '\n' | '\r' => {
                    pieces.push(self.end_of_line());
                    break;
                }
                '-' if self.cursor.second() == '-' => self.lua_comment(),
                '/' if self.accepts_c_comments && matches!(self.cursor.second(), '/' | '*') => self.c_comment(),
                _ => break,
            };
            pieces.push(piece);
        }
        self.cache.trivia_list(pieces)
    }

    fn trivia(&mut self, kind: SyntaxKind, start: TextSize) -> GreenTrivia {
        let text = self.slice(start);
        self.cache.trivia(kind, text)
    }

    fn whitespace(&mut self) -> GreenTrivia {
        let start = self.cursor.offset();
        self.cursor.advance_while(is_inline_space);
        self.trivia(SyntaxKind::WHITESPACE, start)
    }

    fn end_of_line(&mut self) -> GreenTrivia {
        let start = self.cursor.offset();
        self.cursor.eat_line_break();
        self.at_line_start = true;
        self.trivia(SyntaxKind::END_OF_LINE, start)
    }

    fn lua_comment(&mut self) -> GreenTrivia {
        let start = self.cursor.offset();
        self.at_line_start = false;
        self.cursor.advance_bytes(2);

        if let Some(level) = crate::literals::long_bracket_level(self.cursor.rest()) {
            self.cursor.advance_bytes(level + 2);
            let (_, terminated) = self.long_bracket_body(level);
            if !terminated {
                let range = TextRange::new(start, self.cursor.offset());
                self.report(DiagnosticCode::UnterminatedLongComment, range, &[]);
            }
            return self.trivia(SyntaxKind::MULTI_LINE_COMMENT, start);
        }

        self.cursor.advance_while(|c| !is_line_break(c));
        self.trivia(SyntaxKind::SINGLE_LINE_COMMENT, start)
    }

    fn c_comment(&mut self) -> GreenTrivia {
        let start = self.cursor.offset();
        self.at_line_start = false;
        self.cursor.advance();

        if self.cursor.advance() == '/' {
            self.cursor.advance_while(|c| !is_line_break(c));
            return self.trivia(SyntaxKind::SINGLE_LINE_COMMENT, start);
        }

        let rest = self.cursor.rest();
        match rest.find("*/") {
            Some(end) => self.cursor.advance_bytes(end + 2),
            None => {
                self.cursor.advance_bytes(rest.len());
                let range = TextRange::new(start, self.cursor.offset());
                self.report(DiagnosticCode::UnterminatedLongComment, range, &[]);
            }
        }
        self.trivia(SyntaxKind::MULTI_LINE_COMMENT, start)
    }

    fn shebang(&mut self) -> GreenTrivia {
        self.at_line_start = false;
        self.cursor.advance_while(|c| !is_line_break(c));
        self.trivia(SyntaxKind::SHEBANG, TextSize::new(0))
    }

    /// Whole lines skipped by an inactive conditional, up to the next line
    /// that opens with `$`.
    fn disabled_text(&mut self) -> Option<GreenTrivia> {
        let start = self.cursor.offset();
        loop {
            let line = self.cursor.rest();
            if line.is_empty() || line.trim_start_matches(is_inline_space).starts_with('$') {
                break;
            }
            self.cursor.advance_while(|c| !is_line_break(c));
            self.cursor.eat_line_break();
        }
        (self.cursor.offset() > start).then(|| self.trivia(SyntaxKind::DISABLED_TEXT, start))
    }

    fn inline_space(&mut self) -> GreenTriviaList {
        let pieces = if is_inline_space(self.cursor.peek()) { vec![self.whitespace()] } else { Vec::new() };
        self.cache.trivia_list(pieces)
    }

    fn directive(&mut self) -> GreenTrivia {
        let start = self.cursor.offset();
        let rest = self.cursor.rest();
        let line_end = start + TextSize::of(&rest[..rest.find(is_line_break).unwrap_or(rest.len())]);
        self.at_line_start = false;

        let node = match self.directive_parts(line_end) {
            Some((kind, slots)) => self.cache.node(kind, slots),
            None => self.bad_directive(start, line_end),
        };

        let unexpected = match node.kind() {
            SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA | SyntaxKind::ELSE_DIRECTIVE_TRIVIA => {
                !self.directives.has_previous_if_or_elseif()
            }
            SyntaxKind::END_DIRECTIVE_TRIVIA => !self.directives.has_unfinished_if(),
            _ => false,
        };

        let node = if unexpected {
            let keyword = node.slot(1).and_then(GreenElement::as_token).map_or("", GreenToken::text);
            tracing::debug!(keyword, "unexpected directive");
            let diagnostic =
                Diagnostic::at_start(DiagnosticCode::UnexpectedDirective, node.width()).with_args([keyword]);
            node.with_diagnostics(vec![diagnostic])
        } else {
            node
        };

        self.directives = self.directives.add(&node);
        GreenTrivia::structured(node)
    }

    /// Slots of a well-formed directive line, or `None` to fall back to a
    /// bad directive.
    fn directive_parts(&mut self, line_end: TextSize) -> Option<(SyntaxKind, Vec<Option<GreenElement>>)> {
        self.cursor.advance();
        let trailing = self.inline_space();
        let dollar = GreenToken::with_trivia(GreenTriviaList::empty(), SyntaxKind::DOLLAR, trailing);

        let word_start = self.cursor.offset();
        self.cursor.advance_while(|c| c.is_ascii_alphabetic());
        let word = self.slice(word_start);
        let (kind, named) = match word {
            "if" => (SyntaxKind::IF_DIRECTIVE_TRIVIA, true),
            "elseif" => (SyntaxKind::ELSEIF_DIRECTIVE_TRIVIA, true),
            "else" => (SyntaxKind::ELSE_DIRECTIVE_TRIVIA, false),
            "end" => (SyntaxKind::END_DIRECTIVE_TRIVIA, false),
            "define" => (SyntaxKind::DEFINE_DIRECTIVE_TRIVIA, true),
            "undef" => (SyntaxKind::UNDEF_DIRECTIVE_TRIVIA, true),
            _ => return None,
        };
        if self.cursor.peek().is_ascii_alphanumeric() || self.cursor.peek() == '_' {
            return None;
        }

        let trailing = self.inline_space();
        let keyword = match kind {
            SyntaxKind::DEFINE_DIRECTIVE_TRIVIA => {
                GreenToken::contextual_identifier(GreenTriviaList::empty(), SyntaxKind::DEFINE_KW, word, trailing)
            }
            SyntaxKind::UNDEF_DIRECTIVE_TRIVIA => {
                GreenToken::contextual_identifier(GreenTriviaList::empty(), SyntaxKind::UNDEF_KW, word, trailing)
            }
            _ => {
                let keyword = facts::text_to_kind(word)?;
                GreenToken::with_trivia(GreenTriviaList::empty(), keyword, trailing)
            }
        };

        let mut slots = vec![Some(dollar.into()), Some(keyword.into())];
        if named {
            let version = self.version;
            let name_start = self.cursor.offset();
            if !facts::is_identifier_start(self.cursor.peek(), version) {
                return None;
            }
            self.cursor.advance_while(|c| facts::is_identifier_continue(c, version));
            let name = self.slice(name_start);
            let trailing = self.inline_space();
            let name = self.cache.token(
                GreenTriviaList::empty(),
                SyntaxKind::IDENTIFIER,
                name,
                TokenValue::None,
                trailing,
            );
            slots.push(Some(name.into()));
        }

        let mut leading = Vec::new();
        if self.cursor.peek() == '-' && self.cursor.second() == '-' {
            let comment_start = self.cursor.offset();
            self.cursor.advance_while(|c| !is_line_break(c));
            leading.push(self.trivia(SyntaxKind::SINGLE_LINE_COMMENT, comment_start));
        }
        if self.cursor.offset() != line_end {
            return None;
        }

        let leading = self.cache.trivia_list(leading);
        let end = GreenToken::with_trivia(leading, SyntaxKind::END_OF_DIRECTIVE, GreenTriviaList::empty());
        slots.push(Some(end.into()));
        Some((kind, slots))
    }

    /// `$` followed by the rest of the line as a single bad token.
    fn bad_directive(&mut self, start: TextSize, line_end: TextSize) -> GreenNode {
        self.cursor.advance_bytes(usize::from(line_end - self.cursor.offset()));

        let text = {
            let source = self.text;
            &source[TextRange::new(start + TextSize::of('$'), line_end)]
        };
        let empty = GreenTriviaList::empty();
        let slots = vec![
            Some(GreenToken::new(SyntaxKind::DOLLAR).into()),
            Some(self.cache.token(empty.clone(), SyntaxKind::BAD_TOKEN, text, TokenValue::None, empty).into()),
            Some(GreenToken::new(SyntaxKind::END_OF_DIRECTIVE).into()),
        ];
        let node = self.cache.node(SyntaxKind::BAD_DIRECTIVE_TRIVIA, slots);
        tracing::debug!(text, "malformed directive");
        node.with_diagnostics(vec![Diagnostic::at_start(DiagnosticCode::BadDirective, node.width())])
    }
}
