//! Parameter expression language.
//!
//! # Data Flow
//! ```text
//! "{id:int range(1,5) else 404}"
//!     → lexer.rs (tokens with byte spans)
//!     → parser.rs (ParamStatement, diagnostics accumulated)
//!     → ast.rs types, consumed by the segment compiler
//! ```
//!
//! # Design Decisions
//! - Runs at registration time only; nothing here is on the request path
//! - The AST is discarded after compilation

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Arg, ParamFunc, ParamStatement, ParamType};
pub use lexer::Lexer;
pub use parser::{parse_param, Diagnostic, ParseError};
pub use token::{Span, Token, TokenKind};
