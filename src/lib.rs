//! Macro router library.
//!
//! Compiles path templates such as
//! `/games/{gameID:int}/clans/{clanPublicID:int range(1,5)}` into predicate
//! trees, matches request paths against them, and builds URLs back from
//! route names.
//!
//! # Architecture Overview
//!
//! ```text
//!   "{id:int range(1,5) else 404}"
//!          │
//!          ▼
//!   ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//!   │   pattern   │──▶│  registry   │──▶│   routing    │
//!   │lexer/parser │   │types, funcs │   │segment/tree  │
//!   └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                              │ dispatch / build
//!          ┌──────────────────┬────────────────┼──────────────┐
//!          ▼                  ▼                ▼              ▼
//!   ┌─────────────┐   ┌─────────────┐   ┌────────────┐  ┌───────────┐
//!   │   config    │   │  lifecycle  │   │    http    │  │observa-   │
//!   │toml, reload │   │boot/shutdown│   │axum front  │  │bility     │
//!   └─────────────┘   └─────────────┘   └────────────┘  └───────────┘
//! ```

// Core
pub mod pattern;
pub mod registry;
pub mod routing;

// Outer surfaces
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::Macros;
pub use routing::{Dispatch, Router, UrlBuilder};
