//! Parameter type and function registry.
//!
//! # Data Flow
//! ```text
//! ParamStatement (type tag, funcs)
//!     → Macros::get (type → Macro)
//!     → Macro base predicate
//!     → Macros::lookup_func (type table, then master table)
//!     → FuncCompiler(base, args) → refined predicate
//! ```
//!
//! # Design Decisions
//! - Explicit configuration object, no process-wide tables
//! - Function arities are declared up front so the parser can check calls
//! - Refinements AND with the base predicate; the base runs first

pub mod builtins;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::pattern::ast::{Arg, ParamType};

/// Accept/reject decision over one path segment (or the wildcard tail).
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Builds a refined predicate from a base predicate and validated arguments.
pub type FuncCompiler = Arc<dyn Fn(Predicate, &[Arg]) -> Result<Predicate, String> + Send + Sync>;

/// Errors raised while registering types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("parameter type name must not be empty")]
    EmptyName,

    #[error("parameter type \"{0}\" is already registered")]
    DuplicateType(String),

    #[error("alias \"{alias}\" of \"{name}\" collides with an existing type or alias")]
    DuplicateAlias { name: String, alias: String },

    #[error("\"{0}\" cannot be the master type: \"{1}\" already is")]
    DuplicateMaster(String, String),

    #[error("invalid pattern for type \"{name}\": {message}")]
    InvalidPattern { name: String, message: String },
}

/// Syntactic kind of a function argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// An integer literal.
    Int,
    /// Raw text up to the next `,` or `)`.
    Str,
    /// Raw text up to the closing `)`, commas included.
    Raw,
}

/// Fixed arity table entry for one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Exact(&'static [ArgKind]),
    /// One or more arguments of the same kind.
    Variadic(ArgKind),
}

impl Signature {
    /// Kind expected at argument position `index`, if any.
    pub fn kind_at(&self, index: usize) -> Option<ArgKind> {
        match self {
            Signature::Exact(kinds) => kinds.get(index).copied(),
            Signature::Variadic(kind) => Some(*kind),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Signature::Exact(kinds) => kinds.len() == count,
            Signature::Variadic(_) => count >= 1,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Exact(kinds) if kinds.len() == 1 => f.write_str("exactly 1 argument"),
            Signature::Exact(kinds) => write!(f, "exactly {} arguments", kinds.len()),
            Signature::Variadic(_) => f.write_str("at least 1 argument"),
        }
    }
}

/// A registered refinement function.
#[derive(Clone)]
pub struct ParamFuncDef {
    pub signature: Signature,
    compiler: FuncCompiler,
}

impl ParamFuncDef {
    /// Refine `base` with `args`.
    pub fn compile(&self, base: Predicate, args: &[Arg]) -> Result<Predicate, String> {
        (self.compiler)(base, args)
    }
}

impl fmt::Debug for ParamFuncDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamFuncDef")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A parameter type: base predicate plus its function table.
#[derive(Clone)]
pub struct Macro {
    param_type: ParamType,
    alias: Option<String>,
    base: Predicate,
    master: bool,
    trailing: bool,
    accepts_any: bool,
    funcs: HashMap<String, ParamFuncDef>,
}

impl Macro {
    pub fn new(param_type: ParamType, base: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            param_type,
            alias: None,
            base: Arc::new(base),
            master: false,
            trailing: false,
            accepts_any: false,
            funcs: HashMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The master type is implied by `{name}` and lends its functions to
    /// every other type.
    pub fn as_master(mut self) -> Self {
        self.master = true;
        self
    }

    /// Trailing types consume the rest of the path and must come last.
    pub fn as_trailing(mut self) -> Self {
        self.trailing = true;
        self
    }

    /// Marks the base predicate as accepting every value that can reach it.
    pub fn accepting_any(mut self) -> Self {
        self.accepts_any = true;
        self
    }

    pub fn with_func(
        mut self,
        name: impl Into<String>,
        signature: Signature,
        compiler: impl Fn(Predicate, &[Arg]) -> Result<Predicate, String> + Send + Sync + 'static,
    ) -> Self {
        self.funcs.insert(
            name.into(),
            ParamFuncDef {
                signature,
                compiler: Arc::new(compiler),
            },
        );
        self
    }

    pub fn param_type(&self) -> &ParamType {
        &self.param_type
    }

    pub fn name(&self) -> &str {
        self.param_type.name()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn base(&self) -> Predicate {
        self.base.clone()
    }

    pub fn is_master(&self) -> bool {
        self.master
    }

    pub fn is_trailing(&self) -> bool {
        self.trailing
    }

    pub fn accepts_any(&self) -> bool {
        self.accepts_any
    }

    pub fn func(&self, name: &str) -> Option<&ParamFuncDef> {
        self.funcs.get(name)
    }
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut funcs: Vec<_> = self.funcs.keys().collect();
        funcs.sort();
        f.debug_struct("Macro")
            .field("type", &self.param_type)
            .field("alias", &self.alias)
            .field("master", &self.master)
            .field("trailing", &self.trailing)
            .field("funcs", &funcs)
            .finish()
    }
}

/// The type registry handed to the parser and the segment compiler.
#[derive(Debug, Clone, Default)]
pub struct Macros {
    macros: Vec<Arc<Macro>>,
    /// Name or alias → index into `macros`.
    index: HashMap<String, usize>,
}

impl Macros {
    /// An empty registry. See [`Macros::defaults`] for the built-ins.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn register(&mut self, m: Macro) -> Result<(), RegistryError> {
        let name = m.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateType(name));
        }
        if let Some(alias) = m.alias() {
            if alias == name || self.index.contains_key(alias) {
                return Err(RegistryError::DuplicateAlias {
                    name,
                    alias: alias.to_string(),
                });
            }
        }
        if m.is_master() {
            if let Some(current) = self.master() {
                return Err(RegistryError::DuplicateMaster(name, current.name().to_string()));
            }
        }

        let idx = self.macros.len();
        if let Some(alias) = m.alias() {
            self.index.insert(alias.to_string(), idx);
        }
        self.index.insert(name, idx);
        self.macros.push(Arc::new(m));
        Ok(())
    }

    /// Resolve a type by name or alias.
    pub fn lookup_type(&self, name: &str) -> Option<&Arc<Macro>> {
        self.index.get(name).map(|&i| &self.macros[i])
    }

    pub fn get(&self, param_type: &ParamType) -> Option<&Arc<Macro>> {
        self.lookup_type(param_type.name())
    }

    pub fn master(&self) -> Option<&Arc<Macro>> {
        self.macros.iter().find(|m| m.is_master())
    }

    /// Find `name` on the type itself, falling back to the master type.
    pub fn lookup_func<'s>(&'s self, m: &'s Macro, name: &str) -> Option<&'s ParamFuncDef> {
        m.func(name)
            .or_else(|| self.master().and_then(|master| master.func(name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Macro>> {
        self.macros.iter()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

/// AND `check` onto `base`; `base` is evaluated first.
pub fn refine(base: Predicate, check: impl Fn(&str) -> bool + Send + Sync + 'static) -> Predicate {
    Arc::new(move |value: &str| base(value) && check(value))
}
