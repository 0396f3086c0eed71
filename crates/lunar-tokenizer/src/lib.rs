//! Tokenizer for Lua source text.
//!
//! Tokens own the trivia around them. Leading trivia runs up to the token,
//! trailing trivia up to and including the first line break after it, so
//! concatenating the full text of every token reproduces the input.
//! Directive lines and the regions they disable are leading trivia too.

mod cursor;
mod literals;
#[cfg(test)]
mod tests;
mod trivia;

use cursor::Cursor;
use lunar_errors::{Diagnostic, DiagnosticCode};
use lunar_yellow::facts::{self, Feature};
use lunar_yellow::{
    DirectiveStack, GreenNodeCache, GreenToken, LuaVersion, SyntaxKind, SyntaxOptions, TokenValue,
};
use text_size::{TextRange, TextSize};

#[derive(Debug, Clone)]
pub struct Token {
    pub green: GreenToken,
    /// Full range, trivia included.
    pub range: TextRange,
}

impl Token {
    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    pub fn text(&self) -> &str {
        self.green.text()
    }

    /// Range of the token text without its trivia.
    pub fn text_range(&self) -> TextRange {
        let start = self.range.start() + self.green.leading_trivia().width();
        TextRange::at(start, self.green.text_width())
    }
}

pub struct Tokenizer<'t> {
    text: &'t str,
    cursor: Cursor<'t>,
    version: LuaVersion,
    accepts_directives: bool,
    accepts_c_comments: bool,
    accepts_shebang: bool,
    cache: &'t mut GreenNodeCache,
    directives: DirectiveStack,
    at_line_start: bool,
    token_start: TextSize,
    diagnostics: Vec<Diagnostic>,
    current: Token,
}

impl<'t> Tokenizer<'t> {
    pub fn new(text: &'t str, options: &SyntaxOptions, cache: &'t mut GreenNodeCache) -> Self {
        let mut tokenizer = Self {
            text,
            cursor: Cursor::new(text),
            version: options.version,
            accepts_directives: options.accepts_directives(),
            accepts_c_comments: options.accepts_c_comments(),
            accepts_shebang: options.accepts_shebang(),
            cache,
            directives: DirectiveStack::new(options.defined_symbols.iter().cloned()),
            at_line_start: true,
            token_start: TextSize::new(0),
            diagnostics: Vec::new(),
            current: Token { green: GreenToken::new(SyntaxKind::EOF), range: TextRange::default() },
        };
        tokenizer.next_token();
        tokenizer
    }

    /// The lookahead token.
    pub fn peek(&self) -> &Token {
        &self.current
    }

    /// Returns the lookahead token and lexes the one after it. Once the
    /// input is exhausted every call yields an empty `EOF`.
    pub fn next_token(&mut self) -> Token {
        let next = self.lex();
        std::mem::replace(&mut self.current, next)
    }

    pub fn version(&self) -> LuaVersion {
        self.version
    }

    /// Directive state after the lookahead token.
    pub fn directives(&self) -> &DirectiveStack {
        &self.directives
    }

    pub fn cache_mut(&mut self) -> &mut GreenNodeCache {
        self.cache
    }

    fn lex(&mut self) -> Token {
        let start = self.cursor.offset();
        self.token_start = start;

        let leading = self.leading_trivia();
        self.cursor.reset_pos_within_token();
        let (kind, value) = self.scan();
        let text = self.token_text();

        let trailing = if kind == SyntaxKind::EOF {
            if self.directives.has_unfinished_if() {
                let at = TextRange::empty(self.cursor.offset());
                self.report(DiagnosticCode::EndDirectiveExpected, at, &[]);
            }
            self.cache.trivia_list(Vec::new())
        } else {
            self.trailing_trivia()
        };

        let mut green = self.cache.token(leading, kind, text, value, trailing);
        if !self.diagnostics.is_empty() {
            tracing::trace!(?kind, count = self.diagnostics.len(), "token diagnostics");
            green = green.with_diagnostics(std::mem::take(&mut self.diagnostics));
        }
        Token { green, range: TextRange::new(start, self.cursor.offset()) }
    }

    fn scan(&mut self) -> (SyntaxKind, TokenValue) {
        if self.cursor.is_eof() {
            return (SyntaxKind::EOF, TokenValue::None);
        }
        self.at_line_start = false;

        match self.cursor.peek() {
            '0'..='9' => self.number(),
            '.' if self.cursor.second().is_ascii_digit() => self.number(),
            '"' | '\'' => self.short_string(),
            '[' if literals::long_bracket_level(self.cursor.rest()).is_some() => self.long_string(),
            c if facts::is_identifier_start(c, self.version) => self.identifier_or_keyword(),
            _ => self.punctuation(),
        }
    }

    fn identifier_or_keyword(&mut self) -> (SyntaxKind, TokenValue) {
        let version = self.version;
        self.cursor.advance_while(|c| facts::is_identifier_continue(c, version));
        let kind = facts::keyword_kind(self.token_text(), version).unwrap_or(SyntaxKind::IDENTIFIER);
        (kind, TokenValue::None)
    }

    fn punctuation(&mut self) -> (SyntaxKind, TokenValue) {
        let rest = self.cursor.rest();
        let longest = (1..=3).rev().find_map(|len| {
            let kind = facts::text_to_kind(rest.get(..len)?)?;
            kind.is_punctuation().then_some((kind, len))
        });

        let Some((kind, len)) = longest else {
            let c = self.cursor.advance();
            let range = self.token_range();
            self.report(DiagnosticCode::BadCharacter, range, &[c.to_string().as_str()]);
            return (SyntaxKind::BAD_TOKEN, TokenValue::None);
        };

        self.cursor.advance_bytes(len);
        if !facts::is_punctuation(kind, self.version)
            && let Some(feature) = punctuation_feature(kind)
        {
            let range = self.token_range();
            self.require(feature, range);
        }
        (kind, TokenValue::None)
    }

    /// Range of the text scanned since the last reset.
    fn token_range(&self) -> TextRange {
        let end = self.cursor.offset();
        TextRange::new(end - self.cursor.pos_within_token(), end)
    }

    fn token_text(&self) -> &'t str {
        let text = self.text;
        &text[self.token_range()]
    }

    fn slice(&self, start: TextSize) -> &'t str {
        let text = self.text;
        &text[TextRange::new(start, self.cursor.offset())]
    }

    /// Records a diagnostic at the absolute `range` on the token being lexed.
    fn report(&mut self, code: DiagnosticCode, range: TextRange, args: &[&str]) {
        let diagnostic = Diagnostic::new(code, range.start() - self.token_start, range.len())
            .with_args(args.iter().copied());
        self.diagnostics.push(diagnostic);
    }

    fn require(&mut self, feature: Feature, range: TextRange) {
        if !facts::is_feature_available(feature, self.version) {
            let args = [feature.description(), self.version.name()];
            self.report(DiagnosticCode::FeatureNotAvailable, range, &args);
        }
    }
}

fn punctuation_feature(kind: SyntaxKind) -> Option<Feature> {
    use SyntaxKind::*;

    match kind {
        SLASH_SLASH => Some(Feature::FloorDivision),
        AMP | PIPE | TILDE | LT_LT | GT_GT => Some(Feature::BitwiseOperators),
        COLON_COLON => Some(Feature::Goto),
        BANG_EQ | AMP_AMP | PIPE_PIPE | BANG => Some(Feature::CBooleanOperators),
        DOLLAR => Some(Feature::Directives),
        _ => None,
    }
}

/// Lexes all of `text`, `EOF` included.
pub fn tokenize(text: &str, options: &SyntaxOptions) -> Vec<Token> {
    let mut cache = GreenNodeCache::new();
    let mut tokenizer = Tokenizer::new(text, options, &mut cache);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token();
        let at_end = token.kind() == SyntaxKind::EOF;
        tokens.push(token);
        if at_end {
            return tokens;
        }
    }
}
