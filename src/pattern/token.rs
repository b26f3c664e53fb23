//! Tokens produced by the parameter-expression lexer.

use std::fmt;

/// Byte range of a token inside the parameter expression (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.start, self.end)
    }
}

/// Token kinds of the parameter DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    Colon,
    LParen,
    RParen,
    Comma,
    Ident,
    Int,
    Else,
    Eof,
    Illegal,
}

impl TokenKind {
    /// Resolve a single-character token, if `ch` is one.
    pub fn from_symbol(ch: u8) -> Option<Self> {
        match ch {
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b':' => Some(TokenKind::Colon),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b',' => Some(TokenKind::Comma),
            _ => None,
        }
    }

    /// Keywords are identifiers with a reserved meaning.
    pub fn lookup_ident(ident: &str) -> Self {
        match ident {
            "else" => TokenKind::Else,
            _ => TokenKind::Ident,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer",
            TokenKind::Else => "'else'",
            TokenKind::Eof => "end of input",
            TokenKind::Illegal => "illegal character",
        };
        f.write_str(s)
    }
}

/// A lexed token borrowing its literal from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub literal: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, literal: &'a str, start: usize, end: usize) -> Self {
        Self {
            kind,
            literal,
            span: Span::new(start, end),
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
