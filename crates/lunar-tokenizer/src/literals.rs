use lunar_errors::DiagnosticCode;
use lunar_yellow::facts::{self, Feature};
use lunar_yellow::{SyntaxKind, TokenValue};
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::Tokenizer;

/// Level of the long bracket `[`, `=`*level, `[` that opens `text`.
pub(crate) fn long_bracket_level(text: &str) -> Option<usize> {
    let rest = text.strip_prefix('[')?;
    let level = rest.bytes().take_while(|&byte| byte == b'=').count();
    rest[level..].starts_with('[').then_some(level)
}

enum Number {
    Integer(u64),
    Float(f64),
}

impl<'t> Tokenizer<'t> {
    /// Consumes through the closing bracket of `level`, or to the end of
    /// input. Returns the enclosed text and whether the bracket closed.
    pub(crate) fn long_bracket_body(&mut self, level: usize) -> (&'t str, bool) {
        let rest = self.cursor.rest();
        let closing = format!("]{}]", "=".repeat(level));
        match rest.find(&closing) {
            Some(end) => {
                self.cursor.advance_bytes(end + closing.len());
                (&rest[..end], true)
            }
            None => {
                self.cursor.advance_bytes(rest.len());
                (rest, false)
            }
        }
    }

    pub(crate) fn long_string(&mut self) -> (SyntaxKind, TokenValue) {
        let start = self.cursor.offset();
        let level = long_bracket_level(self.cursor.rest()).unwrap_or_default();
        self.cursor.advance_bytes(level + 2);

        let (content, terminated) = self.long_bracket_body(level);
        if !terminated {
            let range = TextRange::new(start, self.cursor.offset());
            self.report(DiagnosticCode::UnterminatedLongString, range, &[]);
        }
        (SyntaxKind::STRING_LITERAL, TokenValue::String(long_string_value(content)))
    }

    pub(crate) fn short_string(&mut self) -> (SyntaxKind, TokenValue) {
        let start = self.cursor.offset();
        let quote = self.cursor.advance();
        let mut value = Vec::new();

        loop {
            if self.cursor.is_eof() || matches!(self.cursor.peek(), '\n' | '\r') {
                let range = TextRange::new(start, self.cursor.offset());
                self.report(DiagnosticCode::UnterminatedString, range, &[]);
                break;
            }
            match self.cursor.peek() {
                c if c == quote => {
                    self.cursor.advance();
                    break;
                }
                '\\' => self.escape(&mut value),
                c => {
                    self.cursor.advance();
                    value.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
                }
            }
        }

        let value = SmolStr::new(String::from_utf8_lossy(&value));
        (SyntaxKind::STRING_LITERAL, TokenValue::String(value))
    }

    fn escape(&mut self, value: &mut Vec<u8>) {
        let start = self.cursor.offset();
        self.cursor.advance();
        if self.cursor.is_eof() {
            return;
        }

        let simple = match self.cursor.peek() {
            'a' => Some(0x07),
            'b' => Some(0x08),
            'f' => Some(0x0c),
            'n' => Some(b'\n'),
            'r' => Some(b'\r'),
            't' => Some(b'\t'),
            'v' => Some(0x0b),
            c @ ('\\' | '"' | '\'') => Some(c as u8),
            _ => None,
        };
        if let Some(byte) = simple {
            self.cursor.advance();
            value.push(byte);
            return;
        }

        match self.cursor.peek() {
            '\n' | '\r' => {
                self.cursor.eat_line_break();
                value.push(b'\n');
            }
            'x' => {
                self.cursor.advance();
                let digits = self.cursor.rest().get(..2).filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()));
                match digits.and_then(|digits| u8::from_str_radix(digits, 16).ok()) {
                    Some(byte) => {
                        self.cursor.advance_bytes(2);
                        value.push(byte);
                    }
                    None => self.invalid_escape(start),
                }
                self.require(Feature::HexEscapes, TextRange::new(start, self.cursor.offset()));
            }
            'z' => {
                self.cursor.advance();
                self.cursor.advance_while(|c| c.is_ascii_whitespace());
                self.require(Feature::WhitespaceEscape, TextRange::new(start, start + TextSize::of("\\z")));
            }
            '0'..='9' => {
                let rest = self.cursor.rest();
                let len = rest.bytes().take(3).take_while(u8::is_ascii_digit).count();
                let decimal = rest[..len].parse::<u16>().ok();
                self.cursor.advance_bytes(len);
                match decimal.and_then(|decimal| u8::try_from(decimal).ok()) {
                    Some(byte) => value.push(byte),
                    None => self.invalid_escape(start),
                }
            }
            'u' => {
                self.cursor.advance();
                match self.unicode_escape() {
                    Some(c) => value.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes()),
                    None => self.invalid_escape(start),
                }
                self.require(Feature::UnicodeEscape, TextRange::new(start, self.cursor.offset()));
            }
            c => {
                self.cursor.advance();
                self.invalid_escape(start);
                value.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
            }
        }
    }

    /// `{XXX}` after `\u`.
    fn unicode_escape(&mut self) -> Option<char> {
        let body = self.cursor.rest().strip_prefix('{')?;
        let digits = body.bytes().take_while(u8::is_ascii_hexdigit).count();
        if digits == 0 || !body[digits..].starts_with('}') {
            return None;
        }
        self.cursor.advance_bytes(digits + 2);
        u32::from_str_radix(&body[..digits], 16).ok().and_then(char::from_u32)
    }

    fn invalid_escape(&mut self, start: TextSize) {
        let range = TextRange::new(start, self.cursor.offset());
        let text = self.slice(start);
        self.report(DiagnosticCode::InvalidEscape, range, &[text]);
    }

    /// Consumes a numeral the way Lua's own lexer does: hex digits,
    /// dots and signed exponents, then any glued alphanumerics, which make
    /// it malformed.
    pub(crate) fn number(&mut self) -> (SyntaxKind, TokenValue) {
        let start = self.cursor.offset();
        let rest = self.cursor.rest();
        let hex = rest.starts_with("0x") || rest.starts_with("0X");
        if hex {
            self.cursor.advance_bytes(2);
        }

        let exponent = if hex { ['p', 'P'] } else { ['e', 'E'] };
        loop {
            let c = self.cursor.peek();
            if exponent.contains(&c) {
                self.cursor.advance();
                _ = self.cursor.eat('+') || self.cursor.eat('-');
            } else if c.is_ascii_hexdigit() || c == '.' {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.cursor.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');

        let range = TextRange::new(start, self.cursor.offset());
        let text = self.slice(start);
        let number = if hex { parse_hex(&text[2..]) } else { parse_decimal(text) };
        let Some(number) = number else {
            self.report(DiagnosticCode::InvalidNumber, range, &[text]);
            return (SyntaxKind::NUMERIC_LITERAL, TokenValue::None);
        };

        let value = match number {
            Number::Integer(value) if facts::is_feature_available(Feature::Integers, self.version) => {
                TokenValue::Integer(value as i64)
            }
            Number::Integer(value) => TokenValue::Float(value as f64),
            Number::Float(value) => {
                if hex {
                    self.require(Feature::HexFloats, range);
                }
                TokenValue::Float(value)
            }
        };
        (SyntaxKind::NUMERIC_LITERAL, value)
    }
}

/// Decimal integers that overflow become floats.
fn parse_decimal(text: &str) -> Option<Number> {
    if text.bytes().all(|byte| byte.is_ascii_digit()) {
        return match text.parse::<i64>() {
            Ok(value) => Some(Number::Integer(value as u64)),
            Err(_) => text.parse().ok().map(Number::Float),
        };
    }
    if !text.bytes().all(|byte| byte.is_ascii_digit() || matches!(byte, b'.' | b'e' | b'E' | b'+' | b'-')) {
        return None;
    }
    text.parse().ok().map(Number::Float)
}

/// Hex integers wrap around; a fraction or binary exponent makes a float.
fn parse_hex(body: &str) -> Option<Number> {
    let (mantissa, exponent) = match body.find(['p', 'P']) {
        Some(index) => (&body[..index], Some(&body[index + 1..])),
        None => (body, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (mantissa, None),
    };

    let digits = || whole.bytes().chain(fraction.unwrap_or_default().bytes());
    if whole.len() + fraction.map_or(0, str::len) == 0 || !digits().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    if fraction.is_none() && exponent.is_none() {
        let value = whole.bytes().fold(0u64, |acc, byte| acc.wrapping_mul(16).wrapping_add(u64::from(hex_digit(byte))));
        return Some(Number::Integer(value));
    }

    let exponent = match exponent {
        Some(exponent) => parse_exponent(exponent)?,
        None => 0,
    };
    let mut value = whole.bytes().fold(0.0, |acc, byte| acc * 16.0 + f64::from(hex_digit(byte)));
    let mut scale = 1.0 / 16.0;
    for byte in fraction.unwrap_or_default().bytes() {
        value += f64::from(hex_digit(byte)) * scale;
        scale /= 16.0;
    }
    Some(Number::Float(value * 2f64.powi(exponent)))
}

fn parse_exponent(text: &str) -> Option<i32> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn hex_digit(byte: u8) -> u32 {
    char::from(byte).to_digit(16).unwrap_or_default()
}

/// Drops the line break right after the opening bracket and normalizes
/// the rest to `\n`.
fn long_string_value(content: &str) -> SmolStr {
    let content = ["\r\n", "\n\r", "\n", "\r"]
        .into_iter()
        .find_map(|line_break| content.strip_prefix(line_break))
        .unwrap_or(content);
    if !content.contains('\r') {
        return SmolStr::new(content);
    }

    let mut value = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            if chars.peek().is_some_and(|&next| (next == '\n' || next == '\r') && next != c) {
                chars.next();
            }
            value.push('\n');
        } else {
            value.push(c);
        }
    }
    SmolStr::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bracket_levels() {
        assert_eq!(long_bracket_level("[["), Some(0));
        assert_eq!(long_bracket_level("[==[ x"), Some(2));
        assert_eq!(long_bracket_level("[=x"), None);
        assert_eq!(long_bracket_level("["), None);
    }

    #[test]
    fn hex_numerals() {
        assert!(matches!(parse_hex("ff"), Some(Number::Integer(255))));
        assert!(matches!(parse_hex("ffffffffffffffffff"), Some(Number::Integer(u64::MAX))));
        assert!(matches!(parse_hex("1p4"), Some(Number::Float(value)) if value == 16.0));
        assert!(matches!(parse_hex(".8"), Some(Number::Float(value)) if value == 0.5));
        assert!(matches!(parse_hex("A.8p-1"), Some(Number::Float(value)) if value == 5.25));
        assert!(parse_hex("").is_none());
        assert!(parse_hex("1p").is_none());
        assert!(parse_hex("1.2.3").is_none());
        assert!(parse_hex("fg").is_none());
    }

    #[test]
    fn decimal_numerals() {
        assert!(matches!(parse_decimal("42"), Some(Number::Integer(42))));
        assert!(matches!(parse_decimal("9223372036854775808"), Some(Number::Float(_))));
        assert!(matches!(parse_decimal("1e3"), Some(Number::Float(value)) if value == 1000.0));
        assert!(matches!(parse_decimal(".5"), Some(Number::Float(value)) if value == 0.5));
        assert!(parse_decimal("3..2").is_none());
        assert!(parse_decimal("1e").is_none());
        assert!(parse_decimal("12abc").is_none());
    }

    #[test]
    fn long_string_line_breaks() {
        assert_eq!(long_string_value("\nfirst\r\nsecond"), "first\nsecond");
        assert_eq!(long_string_value("\r\n"), "");
        assert_eq!(long_string_value(" kept\n"), " kept\n");
    }
}
