//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the macro router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener settings (bind address, host parsing, timeout).
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route declarations, in priority order.
    pub routes: Vec<RouteConfig>,

    /// Extra parameter types defined by a regular expression.
    pub types: Vec<CustomTypeConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Domain the subdomain label is taken relative to (e.g., "example.com").
    /// Without it, a Host with three or more labels yields its first label.
    pub root_domain: Option<String>,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            root_domain: None,
            request_timeout_secs: 30,
        }
    }
}

/// One route declaration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route name used for reverse routing and logging.
    pub name: String,

    /// HTTP method (e.g., "GET").
    #[serde(default = "default_method")]
    pub method: String,

    /// Path pattern such as `/users/{id:uint64 min(1)}`.
    pub path: String,

    /// "" for any host, a literal label, or "*." for any label.
    #[serde(default)]
    pub subdomain: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// A parameter type backed by an anchored regular expression.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CustomTypeConfig {
    /// Type name used after the colon, e.g. `{code:sku}`.
    pub name: String,

    /// Regular expression a segment must match in full.
    pub pattern: String,

    /// Optional second name for the type.
    #[serde(default)]
    pub alias: Option<String>,
}

/// Logging and metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
