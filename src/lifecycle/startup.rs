//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Register custom parameter types
//! - Compile every route into a Router
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Every problem is collected before failing, so one run shows them all
//! - The config's route entry is the handler; the HTTP front echoes it

use std::path::Path;

use thiserror::Error;

use crate::config::validation::parse_method;
use crate::config::{load_config, ConfigError, RouteConfig, RouterConfig};
use crate::registry::builtins::regex_type;
use crate::registry::{Macros, RegistryError};
use crate::routing::{RouteError, Router};

/// One problem found while building the router.
#[derive(Debug, Error)]
pub enum StartupIssue {
    #[error(transparent)]
    Type(#[from] RegistryError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("route \"{route}\": unknown HTTP method \"{method}\"")]
    Method { route: String, method: String },
}

#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{} problem(s) found while compiling routes:\n{}", .0.len(), join(.0))]
    Router(Vec<StartupIssue>),
}

fn join(issues: &[StartupIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Built-in types plus the config's regex types.
pub fn build_macros(config: &RouterConfig) -> Result<Macros, Vec<StartupIssue>> {
    let mut macros = Macros::defaults();
    let mut issues = Vec::new();

    for ty in &config.types {
        let registered = regex_type(&ty.name, &ty.pattern).and_then(|m| {
            let m = match &ty.alias {
                Some(alias) => m.with_alias(alias.clone()),
                None => m,
            };
            macros.register(m)
        });
        match registered {
            Ok(()) => tracing::info!(name = %ty.name, pattern = %ty.pattern, "Registered custom type"),
            Err(e) => issues.push(e.into()),
        }
    }

    if issues.is_empty() {
        Ok(macros)
    } else {
        Err(issues)
    }
}

/// Compile every configured route, in declaration order.
pub fn build_router(config: &RouterConfig) -> Result<Router<RouteConfig>, BootError> {
    let macros = build_macros(config).map_err(BootError::Router)?;
    let mut router = Router::new(macros);
    let mut issues = Vec::new();

    for route in &config.routes {
        let Some(method) = parse_method(&route.method) else {
            issues.push(StartupIssue::Method {
                route: route.name.clone(),
                method: route.method.clone(),
            });
            continue;
        };
        if let Err(e) = router.compile(method, &route.subdomain, &route.path, route.clone(), &route.name) {
            tracing::error!(route = %route.name, path = %route.path, error = %e, "Route rejected");
            issues.push(e.into());
        }
    }

    if !issues.is_empty() {
        return Err(BootError::Router(issues));
    }

    tracing::info!(routes = router.len(), "Router compiled");
    Ok(router)
}

/// Load `path` and compile it.
pub fn boot(path: &Path) -> Result<(RouterConfig, Router<RouteConfig>), BootError> {
    let config = load_config(path)?;
    tracing::info!(
        path = ?path,
        routes = config.routes.len(),
        types = config.types.len(),
        "Configuration loaded"
    );
    let router = build_router(&config)?;
    Ok((config, router))
}
