//! HTTP front for the macro router.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (host → subdomain label)
//!     → routing::Router::dispatch (method, subdomain, path)
//!     → server.rs (outcome → status, headers, JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{subdomain_of, X_REQUEST_ID};
pub use server::HttpServer;
