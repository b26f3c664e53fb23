//! Syntax tree of a single parameter expression.

use std::fmt;
use std::sync::Arc;

/// Parameter type tag. Behavior lives in the type registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Unexpected,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bool,
    Alphabetical,
    File,
    Path,
    Uuid,
    /// A type registered at runtime.
    Custom(Arc<str>),
}

impl ParamType {
    /// Canonical name as written in patterns.
    pub fn name(&self) -> &str {
        match self {
            ParamType::Unexpected => "unexpected",
            ParamType::String => "string",
            ParamType::Int => "int",
            ParamType::Int8 => "int8",
            ParamType::Int16 => "int16",
            ParamType::Int32 => "int32",
            ParamType::Int64 => "int64",
            ParamType::Uint => "uint",
            ParamType::Uint8 => "uint8",
            ParamType::Uint16 => "uint16",
            ParamType::Uint32 => "uint32",
            ParamType::Uint64 => "uint64",
            ParamType::Bool => "bool",
            ParamType::Alphabetical => "alphabetical",
            ParamType::File => "file",
            ParamType::Path => "path",
            ParamType::Uuid => "uuid",
            ParamType::Custom(name) => name,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function argument. The parser knows syntax only, not meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i128),
    Str(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(n) => write!(f, "{n}"),
            Arg::Str(s) => f.write_str(s),
        }
    }
}

/// `name(arg, arg, ...)` applied to a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamFunc {
    pub name: String,
    pub args: Vec<Arg>,
}

/// Root of a parsed `{...}` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamStatement {
    /// The expression as written.
    pub src: String,
    pub name: String,
    pub param_type: ParamType,
    pub funcs: Vec<ParamFunc>,
    /// `None` unless the expression ends with `else <code>`.
    pub else_code: Option<u16>,
}

impl ParamStatement {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            name: String::new(),
            param_type: ParamType::String,
            funcs: Vec::new(),
            else_code: None,
        }
    }
}

/// Canonical form, whitespace-normalized. Two statements with the same
/// canonical form compile to equivalent predicates.
impl fmt::Display for ParamStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}:{}", self.name, self.param_type)?;
        for func in &self.funcs {
            write!(f, " {}(", func.name)?;
            for (i, arg) in func.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(")")?;
        }
        if let Some(code) = self.else_code {
            write!(f, " else {code}")?;
        }
        f.write_str("}")
    }
}
