//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     (method, subdomain, path, handler, name)
//!     → segment.rs (split, parse each {...}, fold predicates)
//!     → matcher.rs (insert into the subdomain's tree)
//!     → handle.rs (publish as immutable Router)
//!
//! Incoming Request (method, subdomain, path):
//!     → router.rs (pick trees: exact, wildcard, root)
//!     → matcher.rs (walk, test predicates, backtrack)
//!     → Return: Matched | MethodNotAllowed | NotFound
//!
//! Reverse:
//!     (route name, params) → reverse.rs → path or absolute URL
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - Priority among parameter types at one position is registration order

pub mod handle;
pub mod matcher;
pub mod reverse;
pub mod router;
pub mod segment;

pub use handle::RouterHandle;
pub use reverse::{BuildError, UrlBuilder};
pub use router::{Dispatch, Params, Route, RouteError, RouteMatch, Router, Subdomain};
pub use segment::{compile_path, CompileError, CompiledParam, CompiledSegment};
