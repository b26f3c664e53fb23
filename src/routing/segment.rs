//! Segment compiler.
//!
//! # Responsibilities
//! - Split a route path on `/` into literal and parameter segments
//! - Compile each `{...}` expression into a predicate closure
//! - Enforce wildcard finality and unique parameter names
//!
//! # Design Decisions
//! - Empty segments are dropped (`/a//b/` compiles like `/a/b`)
//! - `:name` and `*name` are shorthands for `{name}` and `{name:path}`
//! - Every problem in a path is reported, not just the first

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::pattern::{parse_param, ParamStatement, ParseError};
use crate::registry::{Macros, Predicate};

/// Errors raised while compiling a route path.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{segment}: {error}")]
    Parse { segment: String, error: ParseError },

    #[error("{segment}: parameter type \"{type_name}\" must be the last segment of the path")]
    TrailingNotLast { segment: String, type_name: String },

    #[error("{segment}: duplicate parameter name \"{name}\"")]
    DuplicateParam { segment: String, name: String },

    #[error("{segment}: {func}: {message}")]
    Function {
        segment: String,
        func: String,
        message: String,
    },

    #[error("{segment}: parameter type \"{type_name}\" is not registered")]
    UnknownType { segment: String, type_name: String },
}

/// A compiled parameter: its name, predicate and optional `else` code.
#[derive(Clone)]
pub struct CompiledParam {
    name: String,
    predicate: Predicate,
    else_code: Option<u16>,
    /// Canonical statement text; equal keys mean equal predicates.
    key: String,
    type_name: String,
    accepts_any: bool,
}

impl CompiledParam {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, value: &str) -> bool {
        (self.predicate)(value)
    }

    /// Status code the route author asked for when this parameter rejects.
    pub fn else_code(&self) -> Option<u16> {
        self.else_code
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// True for a bare `{name}`: every segment passes.
    pub fn accepts_any(&self) -> bool {
        self.accepts_any
    }
}

impl fmt::Debug for CompiledParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledParam")
            .field("key", &self.key)
            .field("else_code", &self.else_code)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum CompiledSegment {
    Literal(String),
    Dynamic(CompiledParam),
    Wildcard(CompiledParam),
}

impl CompiledSegment {
    pub fn param(&self) -> Option<&CompiledParam> {
        match self {
            CompiledSegment::Literal(_) => None,
            CompiledSegment::Dynamic(p) | CompiledSegment::Wildcard(p) => Some(p),
        }
    }
}

/// Non-empty `/`-separated pieces of `path`.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Compile a full route path.
pub fn compile_path(path: &str, macros: &Macros) -> Result<Vec<CompiledSegment>, Vec<CompileError>> {
    let pieces: Vec<&str> = split_path(path).collect();
    let mut segments = Vec::with_capacity(pieces.len());
    let mut errors = Vec::new();
    let mut names = HashSet::new();

    for (i, piece) in pieces.iter().enumerate() {
        let expr = match expand_shorthand(piece) {
            Some(expr) => expr,
            None => {
                segments.push(CompiledSegment::Literal((*piece).to_string()));
                continue;
            }
        };

        let stmt = match parse_param(&expr, macros) {
            Ok(stmt) => stmt,
            Err(error) => {
                errors.push(CompileError::Parse {
                    segment: (*piece).to_string(),
                    error,
                });
                continue;
            }
        };

        if !names.insert(stmt.name.clone()) {
            errors.push(CompileError::DuplicateParam {
                segment: (*piece).to_string(),
                name: stmt.name.clone(),
            });
        }

        match compile_param(piece, &stmt, macros) {
            Ok((param, trailing)) => {
                if trailing {
                    if i + 1 < pieces.len() {
                        errors.push(CompileError::TrailingNotLast {
                            segment: (*piece).to_string(),
                            type_name: param.type_name.clone(),
                        });
                    }
                    segments.push(CompiledSegment::Wildcard(param));
                } else {
                    segments.push(CompiledSegment::Dynamic(param));
                }
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(segments)
    } else {
        Err(errors)
    }
}

/// The parameter expression for `piece`, or `None` for a literal.
fn expand_shorthand(piece: &str) -> Option<String> {
    if let Some(name) = piece.strip_prefix(':') {
        return Some(format!("{{{name}}}"));
    }
    if let Some(name) = piece.strip_prefix('*') {
        return Some(format!("{{{name}:path}}"));
    }
    if piece.contains('{') || piece.contains('}') {
        return Some(piece.to_string());
    }
    None
}

/// Resolve the statement's type and fold its functions into one predicate.
/// The flag is true for trailing (wildcard) types.
fn compile_param(
    segment: &str,
    stmt: &ParamStatement,
    macros: &Macros,
) -> Result<(CompiledParam, bool), CompileError> {
    let m = macros
        .get(&stmt.param_type)
        .ok_or_else(|| CompileError::UnknownType {
            segment: segment.to_string(),
            type_name: stmt.param_type.name().to_string(),
        })?;

    let mut predicate = m.base();
    for func in &stmt.funcs {
        let def = macros
            .lookup_func(m, &func.name)
            .ok_or_else(|| CompileError::Function {
                segment: segment.to_string(),
                func: func.name.clone(),
                message: format!("unknown function for parameter type {}", m.name()),
            })?;
        predicate = def
            .compile(predicate, &func.args)
            .map_err(|message| CompileError::Function {
                segment: segment.to_string(),
                func: func.name.clone(),
                message,
            })?;
    }

    let param = CompiledParam {
        name: stmt.name.clone(),
        predicate,
        else_code: stmt.else_code,
        key: stmt.to_string(),
        type_name: m.name().to_string(),
        accepts_any: m.accepts_any() && stmt.funcs.is_empty(),
    };
    Ok((param, m.is_trailing()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(path: &str) -> Result<Vec<CompiledSegment>, Vec<CompileError>> {
        compile_path(path, &Macros::defaults())
    }

    #[test]
    fn test_literal_and_dynamic_segments() {
        let segments = compile("/games/{gameID:int}/clans/{clanPublicID:int range(1,5)}").unwrap();
        assert_eq!(segments.len(), 4);
        assert!(matches!(&segments[0], CompiledSegment::Literal(s) if s == "games"));
        let clan = segments[3].param().unwrap();
        assert_eq!(clan.name(), "clanPublicID");
        assert!(clan.matches("5"));
        assert!(!clan.matches("6"));
        assert_eq!(clan.else_code(), None);
    }

    #[test]
    fn test_empty_segments_ignored() {
        let segments = compile("//api///users/").unwrap();
        assert_eq!(segments.len(), 2);
        assert!(compile("/").unwrap().is_empty());
    }

    #[test]
    fn test_wildcard_must_be_last() {
        let errors = compile("/files/{rest:path}/edit").unwrap_err();
        assert!(matches!(errors[0], CompileError::TrailingNotLast { .. }));

        let segments = compile("/files/{rest:path}").unwrap();
        assert!(matches!(segments[1], CompiledSegment::Wildcard(_)));
    }

    #[test]
    fn test_duplicate_param_names() {
        let errors = compile("/{id:int}/x/{id:string}").unwrap_err();
        assert!(matches!(&errors[0], CompileError::DuplicateParam { name, .. } if name == "id"));
    }

    #[test]
    fn test_shorthand_syntax() {
        let segments = compile("/users/:name/*rest").unwrap();
        assert!(segments[1].param().unwrap().accepts_any());
        assert!(matches!(segments[2], CompiledSegment::Wildcard(_)));
    }

    #[test]
    fn test_else_code_recorded() {
        let segments = compile("/{id:int else 402}").unwrap();
        assert_eq!(segments[0].param().unwrap().else_code(), Some(402));
    }

    #[test]
    fn test_errors_collected_across_segments() {
        let errors = compile("/{a:nope}/{b:int range(5,1)}").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], CompileError::Parse { .. }));
        assert!(matches!(errors[1], CompileError::Function { .. }));
    }

    #[test]
    fn test_refined_param_is_not_catch_all() {
        let segments = compile("/{name:string min(3)}").unwrap();
        assert!(!segments[0].param().unwrap().accepts_any());
    }
}
