use std::str::Chars;

use text_size::{TextLen, TextSize};

pub(crate) const EOF_CHAR: char = '\0';

pub(crate) struct Cursor<'t> {
    chars: Chars<'t>,
    text_len: TextSize,
    len: TextSize,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self { chars: text.chars(), text_len: text.text_len(), len: text.text_len() }
    }

    /// Bytes left to read.
    pub(crate) fn len(&self) -> TextSize {
        TextSize::new(self.chars.as_str().len() as u32)
    }

    pub(crate) fn offset(&self) -> TextSize {
        self.text_len - self.len()
    }

    pub(crate) fn rest(&self) -> &'t str {
        self.chars.as_str()
    }

    pub(crate) fn pos_within_token(&self) -> TextSize {
        self.len - self.len()
    }

    pub(crate) fn reset_pos_within_token(&mut self) {
        self.len = self.len();
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    pub(crate) fn peek(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn second(&self) -> char {
        self.chars.clone().nth(1).unwrap_or(EOF_CHAR)
    }

    pub(crate) fn matches(&self, c: char) -> bool {
        !self.is_eof() && self.peek() == c
    }

    pub(crate) fn advance(&mut self) -> char {
        self.chars.next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn eat(&mut self, c: char) -> bool {
        let matched = self.matches(c);
        if matched {
            self.advance();
        }
        matched
    }

    /// Skips `bytes` bytes, which must end on a char boundary.
    pub(crate) fn advance_bytes(&mut self, bytes: usize) {
        let rest = self.chars.as_str();
        self.chars = rest[bytes.min(rest.len())..].chars();
    }

    pub(crate) fn advance_while(&mut self, f: impl Fn(char) -> bool + Copy) {
        while !self.is_eof() && f(self.peek()) {
            self.advance();
        }
    }

    /// Consumes one line break: `\r\n`, `\n\r`, `\n` or `\r`.
    pub(crate) fn eat_line_break(&mut self) -> bool {
        match self.peek() {
            first @ ('\n' | '\r') => {
                self.advance();
                let second = self.peek();
                if (second == '\n' || second == '\r') && second != first {
                    self.advance();
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_token_boundaries() {
        let mut cursor = Cursor::new("local x");
        cursor.advance_while(|c| c.is_ascii_alphabetic());
        assert_eq!(cursor.pos_within_token(), TextSize::new(5));
        cursor.reset_pos_within_token();
        assert!(cursor.eat(' '));
        assert_eq!(cursor.offset(), TextSize::new(6));
        assert_eq!(cursor.rest(), "x");
        assert_eq!(cursor.second(), EOF_CHAR);
        cursor.advance();
        assert!(cursor.is_eof());
        assert!(!cursor.matches(EOF_CHAR));
    }

    #[test]
    fn line_breaks_pair_up_once() {
        let mut cursor = Cursor::new("\r\n\n\r\r");
        assert!(cursor.eat_line_break());
        assert_eq!(cursor.offset(), TextSize::new(2));
        assert!(cursor.eat_line_break());
        assert_eq!(cursor.offset(), TextSize::new(4));
        assert!(cursor.eat_line_break());
        assert!(!cursor.eat_line_break());
    }
}
