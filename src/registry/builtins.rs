//! Built-in parameter types and their functions.
//!
//! | type           | matches                                        |
//! |----------------|------------------------------------------------|
//! | `string`       | any non-empty segment (master type)            |
//! | `int`/`number` | optional `-`, digits, within `i64`             |
//! | `int8..int64`  | same, within the sized range (`long` = int64)  |
//! | `uint`         | digits only, within `u64`                      |
//! | `uint8..64`    | digits only, within the sized range            |
//! | `bool`         | `1 t T TRUE true True 0 f F FALSE false False` |
//! | `alphabetical` | ASCII letters                                  |
//! | `file`         | letters, digits, `_`, `-`, `.`                 |
//! | `path`         | the rest of the path, no leading/trailing `/`  |
//! | `uuid`         | a UUID (`uuidv4`)                              |

use std::str::FromStr;

use regex::Regex;

use crate::pattern::ast::{Arg, ParamType};
use crate::registry::{refine, ArgKind, Macro, Macros, Predicate, RegistryError, Signature};

const ONE_INT: Signature = Signature::Exact(&[ArgKind::Int]);
const TWO_INTS: Signature = Signature::Exact(&[ArgKind::Int, ArgKind::Int]);
const ONE_STR: Signature = Signature::Exact(&[ArgKind::Str]);

impl Macros {
    /// Registry preloaded with every built-in type.
    pub fn defaults() -> Self {
        let mut macros = Macros::empty();
        for m in [
            string(),
            signed::<i64>(ParamType::Int).with_alias("number"),
            signed::<i8>(ParamType::Int8),
            signed::<i16>(ParamType::Int16),
            signed::<i32>(ParamType::Int32),
            signed::<i64>(ParamType::Int64).with_alias("long"),
            unsigned::<u64>(ParamType::Uint),
            unsigned::<u8>(ParamType::Uint8),
            unsigned::<u16>(ParamType::Uint16),
            unsigned::<u32>(ParamType::Uint32),
            unsigned::<u64>(ParamType::Uint64),
            boolean(),
            alphabetical(),
            file(),
            path(),
            uuid(),
        ] {
            // Built-in names are distinct, so registration cannot fail.
            if let Err(e) = macros.register(m) {
                tracing::error!(error = %e, "Built-in parameter type rejected");
            }
        }
        macros
    }
}

/// A custom type whose values must fully match `pattern`.
pub fn regex_type(name: &str, pattern: &str) -> Result<Macro, RegistryError> {
    let re = anchored(pattern).map_err(|message| RegistryError::InvalidPattern {
        name: name.to_string(),
        message,
    })?;
    Ok(Macro::new(ParamType::Custom(name.into()), move |v: &str| {
        !v.is_empty() && re.is_match(v)
    }))
}

fn anchored(expr: &str) -> Result<Regex, String> {
    Regex::new(&format!("^(?:{expr})$")).map_err(|e| e.to_string())
}

fn int_arg<T: TryFrom<i128>>(args: &[Arg], index: usize) -> Result<T, String> {
    match args.get(index) {
        Some(Arg::Int(n)) => {
            T::try_from(*n).map_err(|_| format!("argument {n} is out of range for this type"))
        }
        Some(Arg::Str(s)) => Err(format!("expected an integer argument but got {s}")),
        None => Err(format!("missing argument #{}", index + 1)),
    }
}

fn str_arg(args: &[Arg], index: usize) -> Result<String, String> {
    match args.get(index) {
        Some(arg) => Ok(arg.to_string()),
        None => Err(format!("missing argument #{}", index + 1)),
    }
}

fn is_unsigned_digits(v: &str) -> bool {
    !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit())
}

fn is_signed_digits(v: &str) -> bool {
    is_unsigned_digits(v.strip_prefix('-').unwrap_or(v))
}

fn string() -> Macro {
    Macro::new(ParamType::String, |v: &str| !v.is_empty() && !v.contains('/'))
        .as_master()
        .accepting_any()
        .with_func("regexp", Signature::Exact(&[ArgKind::Raw]), |base, args| {
            let re = anchored(&str_arg(args, 0)?)?;
            Ok(refine(base, move |v| re.is_match(v)))
        })
        .with_func("prefix", ONE_STR, |base, args| {
            let prefix = str_arg(args, 0)?;
            Ok(refine(base, move |v| v.starts_with(prefix.as_str())))
        })
        .with_func("suffix", ONE_STR, |base, args| {
            let suffix = str_arg(args, 0)?;
            Ok(refine(base, move |v| v.ends_with(suffix.as_str())))
        })
        .with_func("contains", ONE_STR, |base, args| {
            let needle = str_arg(args, 0)?;
            Ok(refine(base, move |v| v.contains(needle.as_str())))
        })
        .with_func("min", ONE_INT, |base, args| {
            let min: usize = int_arg(args, 0)?;
            Ok(refine(base, move |v| v.chars().count() >= min))
        })
        .with_func("max", ONE_INT, |base, args| {
            let max: usize = int_arg(args, 0)?;
            Ok(refine(base, move |v| v.chars().count() <= max))
        })
        .with_func("eq", ONE_STR, |base, args| {
            let expected = str_arg(args, 0)?;
            Ok(refine(base, move |v| v == expected))
        })
        .with_func("eqor", Signature::Variadic(ArgKind::Str), |base, args| {
            let options: Vec<String> = args.iter().map(ToString::to_string).collect();
            Ok(refine(base, move |v| options.iter().any(|o| o == v)))
        })
}

fn signed<T>(param_type: ParamType) -> Macro
where
    T: FromStr + PartialOrd + Copy + TryFrom<i128> + Send + Sync + 'static,
{
    numeric::<T>(param_type, |v| is_signed_digits(v) && v.parse::<T>().is_ok())
}

fn unsigned<T>(param_type: ParamType) -> Macro
where
    T: FromStr + PartialOrd + Copy + TryFrom<i128> + Send + Sync + 'static,
{
    numeric::<T>(param_type, |v| is_unsigned_digits(v) && v.parse::<T>().is_ok())
}

fn numeric<T>(param_type: ParamType, base: fn(&str) -> bool) -> Macro
where
    T: FromStr + PartialOrd + Copy + TryFrom<i128> + Send + Sync + 'static,
{
    Macro::new(param_type, base)
        .with_func("min", ONE_INT, |base, args| {
            let min: T = int_arg(args, 0)?;
            Ok(in_bounds(base, Some(min), None))
        })
        .with_func("max", ONE_INT, |base, args| {
            let max: T = int_arg(args, 0)?;
            Ok(in_bounds(base, None, Some(max)))
        })
        .with_func("range", TWO_INTS, |base, args| {
            let min: T = int_arg(args, 0)?;
            let max: T = int_arg(args, 1)?;
            if min > max {
                return Err(format!("range({}, {}): min is greater than max", args[0], args[1]));
            }
            Ok(in_bounds(base, Some(min), Some(max)))
        })
}

fn in_bounds<T>(base: Predicate, min: Option<T>, max: Option<T>) -> Predicate
where
    T: FromStr + PartialOrd + Copy + Send + Sync + 'static,
{
    refine(base, move |v| match v.parse::<T>() {
        Ok(n) => min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m),
        Err(_) => false,
    })
}

fn boolean() -> Macro {
    Macro::new(ParamType::Bool, |v: &str| {
        matches!(
            v,
            "1" | "t" | "T" | "TRUE" | "true" | "True" | "0" | "f" | "F" | "FALSE" | "false" | "False"
        )
    })
    .with_alias("boolean")
}

fn alphabetical() -> Macro {
    Macro::new(ParamType::Alphabetical, |v: &str| {
        !v.is_empty() && v.bytes().all(|b| b.is_ascii_alphabetic())
    })
}

fn file() -> Macro {
    Macro::new(ParamType::File, |v: &str| {
        !v.is_empty()
            && v
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
    })
}

fn path() -> Macro {
    // Captured remainders never carry edge slashes.
    Macro::new(ParamType::Path, |v: &str| {
        !v.starts_with('/') && !v.ends_with('/')
    })
        .as_trailing()
        .accepting_any()
}

fn uuid() -> Macro {
    Macro::new(ParamType::Uuid, |v: &str| uuid::Uuid::parse_str(v).is_ok()).with_alias("uuidv4")
}
