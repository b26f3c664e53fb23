//! Parameter expression parser.
//!
//! # Grammar
//! ```text
//! statement := '{' IDENT [ ':' type ] func_call* [ 'else' INT ] '}'
//! type      := IDENT
//! func_call := IDENT '(' [ arg (',' arg)* ] ')'
//! arg       := INT | raw text
//! ```
//!
//! # Design Decisions
//! - Problems are collected, not short-circuited: one parse reports every
//!   mistake in the expression
//! - Types and function arities come from the registry, so unknown types,
//!   unknown functions and wrong arities are parse errors
//! - The statement defaults to the registry's master type

use std::fmt;

use thiserror::Error;

use crate::pattern::ast::{Arg, ParamFunc, ParamStatement, ParamType};
use crate::pattern::lexer::{Lexer, RawMode};
use crate::pattern::token::{Span, Token, TokenKind};
use crate::registry::{ArgKind, Macro, Macros};

/// Lowest and highest status code accepted after `else`.
const ELSE_CODE_RANGE: std::ops::RangeInclusive<u16> = 100..=599;

/// A single positioned problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.span, self.message)
    }
}

/// Every problem found in one parameter expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join(.diagnostics))]
pub struct ParseError {
    pub src: String,
    pub diagnostics: Vec<Diagnostic>,
}

fn join(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse one `{...}` expression against `macros`.
pub fn parse_param(src: &str, macros: &Macros) -> Result<ParamStatement, ParseError> {
    ParamParser::new(src, macros).parse()
}

pub struct ParamParser<'a> {
    src: &'a str,
    lexer: Lexer<'a>,
    macros: &'a Macros,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ParamParser<'a> {
    pub fn new(src: &'a str, macros: &'a Macros) -> Self {
        Self {
            src,
            lexer: Lexer::new(src),
            macros,
            diagnostics: Vec::new(),
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            span,
            message: message.into(),
        });
    }

    pub fn parse(mut self) -> Result<ParamStatement, ParseError> {
        let mut stmt = ParamStatement::new(self.src);
        let mut current = self.macros.master().cloned();
        if let Some(m) = &current {
            stmt.param_type = m.param_type().clone();
        }

        let mut tok = self.lexer.next_token();
        if tok.is(TokenKind::LBrace) {
            tok = self.lexer.next_token();
        } else {
            self.error(tok.span, format!("expected '{{' but found {}", describe(&tok)));
        }

        if tok.is(TokenKind::Ident) {
            stmt.name = tok.literal.to_string();
            tok = self.lexer.next_token();
        } else {
            self.error(tok.span, "parameter name is missing");
        }

        if tok.is(TokenKind::Colon) {
            let ty = self.lexer.next_token();
            if ty.is(TokenKind::Ident) {
                match self.macros.lookup_type(ty.literal) {
                    Some(m) => {
                        stmt.param_type = m.param_type().clone();
                        current = Some(m.clone());
                    }
                    None => {
                        self.error(ty.span, format!("unexpected parameter type: {}", ty.literal));
                        stmt.param_type = ParamType::Unexpected;
                        current = None;
                    }
                }
                tok = self.lexer.next_token();
            } else {
                self.error(ty.span, "missing parameter type after ':'");
                tok = ty;
            }
        }

        loop {
            match tok.kind {
                TokenKind::Ident => {
                    if let Some(func) = self.parse_func(tok, current.as_deref()) {
                        stmt.funcs.push(func);
                    }
                }
                TokenKind::Else => {
                    let code = self.lexer.next_token();
                    if let Some(code) = self.parse_else_code(code) {
                        if stmt.else_code.replace(code).is_some() {
                            self.error(tok.span, "else code is set more than once");
                        }
                    }
                }
                TokenKind::RBrace => {
                    let trailing = self.lexer.next_token();
                    if !trailing.is(TokenKind::Eof) {
                        self.error(trailing.span, format!("unexpected {} after '}}'", describe(&trailing)));
                    }
                    break;
                }
                TokenKind::Eof => {
                    self.error(tok.span, "missing closing '}'");
                    break;
                }
                TokenKind::Illegal => {
                    self.error(tok.span, format!("illegal token: {}", tok.literal));
                }
                _ => {
                    self.error(tok.span, format!("unexpected {}", describe(&tok)));
                }
            }
            tok = self.lexer.next_token();
        }

        if self.diagnostics.is_empty() {
            Ok(stmt)
        } else {
            Err(ParseError {
                src: self.src.to_string(),
                diagnostics: self.diagnostics,
            })
        }
    }

    fn parse_else_code(&mut self, tok: Token<'_>) -> Option<u16> {
        if !tok.is(TokenKind::Int) {
            self.error(
                tok.span,
                format!("expected error code to be an integer but got {}", describe(&tok)),
            );
            return None;
        }
        match tok.literal.parse::<u16>() {
            Ok(code) if ELSE_CODE_RANGE.contains(&code) => Some(code),
            _ => {
                self.error(
                    tok.span,
                    format!("error code {} is not a valid HTTP status code", tok.literal),
                );
                None
            }
        }
    }

    /// Parses `name(args)` with `name` already consumed.
    fn parse_func(&mut self, name: Token<'a>, current: Option<&Macro>) -> Option<ParamFunc> {
        if self.lexer.peek_kind() != TokenKind::LParen {
            self.error(name.span, format!("expected '(' after function {}", name.literal));
            return None;
        }
        self.lexer.next_token();

        let def = current.and_then(|m| self.macros.lookup_func(m, name.literal));
        let Some(def) = def.cloned() else {
            if let Some(m) = current {
                self.error(
                    name.span,
                    format!("unknown function {} for parameter type {}", name.literal, m.name()),
                );
            }
            // Skip the arguments; the call is already reported or the type is unknown.
            self.lexer.next_raw(RawMode::UntilClose);
            let close = self.lexer.next_token();
            if !close.is(TokenKind::RParen) {
                self.error(close.span, format!("unbalanced parentheses in call to {}", name.literal));
            }
            return None;
        };

        let errors_before = self.diagnostics.len();
        let mut args = Vec::new();

        if self.lexer.peek_kind() == TokenKind::RParen {
            self.lexer.next_token();
        } else {
            loop {
                let kind = def.signature.kind_at(args.len());
                let tok = match kind {
                    Some(ArgKind::Str) => self.lexer.next_raw(RawMode::UntilComma),
                    Some(ArgKind::Raw) => self.lexer.next_raw(RawMode::UntilClose),
                    _ => self.lexer.next_token(),
                };
                let raw = matches!(kind, Some(ArgKind::Str | ArgKind::Raw));

                match tok.kind {
                    TokenKind::Ident if raw => {
                        if tok.literal.is_empty() {
                            self.error(tok.span, format!("empty argument in call to {}", name.literal));
                        } else {
                            args.push(Arg::Str(tok.literal.to_string()));
                        }
                    }
                    TokenKind::Int => match tok.literal.parse::<i128>() {
                        Ok(n) => args.push(Arg::Int(n)),
                        Err(_) => {
                            self.error(tok.span, format!("integer literal {} is too large", tok.literal));
                        }
                    },
                    TokenKind::Ident | TokenKind::Else => {
                        self.error(
                            tok.span,
                            format!(
                                "{}: expected an integer argument but got {}",
                                name.literal, tok.literal
                            ),
                        );
                        args.push(Arg::Str(tok.literal.to_string()));
                    }
                    TokenKind::RParen => {
                        self.error(tok.span, format!("trailing comma in call to {}", name.literal));
                        break;
                    }
                    TokenKind::Comma => {
                        self.error(tok.span, format!("empty argument in call to {}", name.literal));
                        continue;
                    }
                    TokenKind::Eof => {
                        self.error(tok.span, format!("unbalanced parentheses in call to {}", name.literal));
                        return None;
                    }
                    _ => {
                        self.error(
                            tok.span,
                            format!("unexpected {} in call to {}", describe(&tok), name.literal),
                        );
                    }
                }

                let sep = self.lexer.next_token();
                match sep.kind {
                    TokenKind::Comma => continue,
                    TokenKind::RParen => break,
                    TokenKind::Eof => {
                        self.error(sep.span, format!("unbalanced parentheses in call to {}", name.literal));
                        return None;
                    }
                    _ => {
                        self.error(
                            sep.span,
                            format!("expected ',' or ')' but found {}", describe(&sep)),
                        );
                        break;
                    }
                }
            }
        }

        if self.diagnostics.len() > errors_before {
            return None;
        }
        if !def.signature.accepts(args.len()) {
            self.error(
                name.span,
                format!(
                    "function {} expects {}, got {}",
                    name.literal,
                    def.signature,
                    args.len()
                ),
            );
            return None;
        }

        Some(ParamFunc {
            name: name.literal.to_string(),
            args,
        })
    }
}

fn describe(tok: &Token<'_>) -> String {
    match tok.kind {
        TokenKind::Eof => tok.kind.to_string(),
        _ => format!("{} {:?}", tok.kind, tok.literal),
    }
}
