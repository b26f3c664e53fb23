//! Lexer for parameter expressions (`{name:type func(args) else code}`).
//!
//! # Responsibilities
//! - Turn the text of one `{...}` segment into tokens with byte spans
//! - Read raw function arguments for string and regexp functions
//!
//! # Design Decisions
//! - Identifiers start with a letter or `_` and may continue with digits
//!   (`uint64`, `myparam2`)
//! - An integer may carry a leading `-` directly followed by a digit
//! - Once input is exhausted every call returns `Eof` at the same offset

use crate::pattern::token::{Token, TokenKind};

/// How far a raw argument read extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawMode {
    /// Stop at the next top-level `,` or `)`.
    UntilComma,
    /// Stop at the `)` that closes the call; commas are part of the argument.
    UntilClose,
}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_byte(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek_byte().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    /// Returns the next token and advances past it.
    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(ch) = self.peek_byte() else {
            return Token::new(TokenKind::Eof, "", start, start);
        };

        if let Some(kind) = TokenKind::from_symbol(ch) {
            self.pos += 1;
            return Token::new(kind, &self.src[start..self.pos], start, self.pos);
        }

        if is_letter(ch) {
            self.read_while(|b| is_letter(b) || b.is_ascii_digit());
            let lit = &self.src[start..self.pos];
            return Token::new(TokenKind::lookup_ident(lit), lit, start, self.pos);
        }

        let signed = ch == b'-'
            && self
                .src
                .as_bytes()
                .get(start + 1)
                .is_some_and(|b| b.is_ascii_digit());
        if ch.is_ascii_digit() || signed {
            self.pos += 1;
            self.read_while(|b| b.is_ascii_digit());
            return Token::new(TokenKind::Int, &self.src[start..self.pos], start, self.pos);
        }

        // Consume the whole character so the literal stays valid UTF-8.
        let width = self.src[start..].chars().next().map_or(1, char::len_utf8);
        self.pos += width;
        Token::new(TokenKind::Illegal, &self.src[start..self.pos], start, self.pos)
    }

    /// Kind of the next token without consuming it.
    pub fn peek_kind(&self) -> TokenKind {
        self.clone().next_token().kind
    }

    /// Reads a raw function argument as an `Ident` token.
    ///
    /// Parentheses nest and `\` escapes the following byte, so a regular
    /// expression like `^[a-z]{1,3}(\)|x)$` is read in one piece. The stop
    /// character is not consumed. The literal is trimmed and may be empty.
    pub fn next_raw(&mut self, mode: RawMode) -> Token<'a> {
        self.skip_whitespace();
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;

        while let Some(&b) = bytes.get(self.pos) {
            match b {
                b'\\' => {
                    self.pos = (self.pos + 2).min(bytes.len());
                    continue;
                }
                b'(' => depth += 1,
                b')' if depth == 0 => break,
                b')' => depth -= 1,
                b',' if depth == 0 && mode == RawMode::UntilComma => break,
                _ => {}
            }
            self.pos += 1;
        }

        let raw = &self.src[start..self.pos];
        let lit = raw.trim_end();
        Token::new(TokenKind::Ident, lit, start, start + lit.len())
    }
}

fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            out.push(tok.kind);
            if tok.is(TokenKind::Eof) {
                return out;
            }
        }
    }

    #[test]
    fn test_full_statement() {
        use TokenKind::*;
        assert_eq!(
            kinds("{id:int range(1,5) else 404}"),
            vec![
                LBrace, Ident, Colon, Ident, Ident, LParen, Int, Comma, Int, RParen, Else, Int,
                RBrace, Eof
            ]
        );
    }

    #[test]
    fn test_identifier_with_digits() {
        let mut lexer = Lexer::new("uint64 2x");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Ident);
        assert_eq!(tok.literal, "uint64");
        assert_eq!(lexer.next_token().kind, TokenKind::Int);
        assert_eq!(lexer.next_token().literal, "x");
    }

    #[test]
    fn test_negative_int() {
        let mut lexer = Lexer::new("-5 -");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Int);
        assert_eq!(tok.literal, "-5");
        assert_eq!(lexer.next_token().kind, TokenKind::Illegal);
    }

    #[test]
    fn test_illegal_token_span() {
        let mut lexer = Lexer::new("{id$int}");
        lexer.next_token();
        lexer.next_token();
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Illegal);
        assert_eq!(tok.literal, "$");
        assert_eq!((tok.span.start, tok.span.end), (3, 4));
    }

    #[test]
    fn test_multibyte_illegal() {
        let mut lexer = Lexer::new("é}");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Illegal);
        assert_eq!(tok.literal, "é");
        assert_eq!(lexer.next_token().kind, TokenKind::RBrace);
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut lexer = Lexer::new("a");
        assert_eq!(lexer.next_token().kind, TokenKind::Ident);
        let end = lexer.offset();
        for _ in 0..5 {
            let tok = lexer.next_token();
            assert_eq!(tok.kind, TokenKind::Eof);
            assert_eq!(tok.span.start, end);
        }
        assert_eq!(lexer.offset(), end);
    }

    #[test]
    fn test_raw_argument_until_comma() {
        let mut lexer = Lexer::new(" a.b , c)");
        let tok = lexer.next_raw(RawMode::UntilComma);
        assert_eq!(tok.literal, "a.b");
        assert_eq!(lexer.next_token().kind, TokenKind::Comma);
    }

    #[test]
    fn test_raw_argument_nested_parens() {
        let mut lexer = Lexer::new("^([a-z]{1,3}|\\))$) else 404");
        let tok = lexer.next_raw(RawMode::UntilClose);
        assert_eq!(tok.literal, "^([a-z]{1,3}|\\))$");
        assert_eq!(lexer.next_token().kind, TokenKind::RParen);
        assert_eq!(lexer.next_token().kind, TokenKind::Else);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let lexer = Lexer::new(")");
        assert_eq!(lexer.peek_kind(), TokenKind::RParen);
        assert_eq!(lexer.offset(), 0);
    }
}
