//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route names are present and unique
//! - Check methods, paths and addresses are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Pattern syntax is checked later, when routes compile

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::RouterConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route #{0} has an empty name")]
    EmptyRouteName(usize),

    #[error("route name \"{0}\" is used more than once")]
    DuplicateRouteName(String),

    #[error("route \"{route}\": unknown HTTP method \"{method}\"")]
    UnknownMethod { route: String, method: String },

    #[error("route \"{route}\": path \"{path}\" must start with '/'")]
    RelativePath { route: String, path: String },

    #[error("{field}: \"{value}\" is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("custom type #{0} has an empty name")]
    EmptyTypeName(usize),

    #[error("custom type \"{0}\" has an empty pattern")]
    EmptyTypePattern(String),
}

/// Check `config` and return every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName(i));
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRouteName(route.name.clone()));
        }

        if parse_method(&route.method).is_none() {
            errors.push(ValidationError::UnknownMethod {
                route: route.name.clone(),
                method: route.method.clone(),
            });
        }

        if !route.path.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                route: route.name.clone(),
                path: route.path.clone(),
            });
        }
    }

    for (i, ty) in config.types.iter().enumerate() {
        if ty.name.trim().is_empty() {
            errors.push(ValidationError::EmptyTypeName(i));
        } else if ty.pattern.trim().is_empty() {
            errors.push(ValidationError::EmptyTypePattern(ty.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Standard HTTP methods, case-insensitive.
pub fn parse_method(raw: &str) -> Option<Method> {
    let method = match raw.trim().to_ascii_uppercase().as_str() {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "DELETE" => Method::DELETE,
        "PATCH" => Method::PATCH,
        "HEAD" => Method::HEAD,
        "OPTIONS" => Method::OPTIONS,
        "CONNECT" => Method::CONNECT,
        "TRACE" => Method::TRACE,
        _ => return None,
    };
    Some(method)
}
