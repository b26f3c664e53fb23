//! Atomic publication of a built router.
//!
//! # Design Decisions
//! - Readers take a snapshot with `load()` and keep it for one request
//! - A reload builds a complete router off to the side, then swaps it in
//! - Routes are never added to a published router

use std::sync::Arc;

use arc_swap::ArcSwap;

use super::router::Router;

/// Shared, swappable reference to the live router.
pub struct RouterHandle<H> {
    current: ArcSwap<Router<H>>,
}

impl<H> RouterHandle<H> {
    pub fn new(router: Router<H>) -> Self {
        tracing::info!(routes = router.len(), "Published router");
        Self {
            current: ArcSwap::from_pointee(router),
        }
    }

    /// Snapshot of the router currently being served.
    pub fn load(&self) -> Arc<Router<H>> {
        self.current.load_full()
    }

    /// Replace the live router. In-flight requests finish on their snapshot.
    pub fn publish(&self, router: Router<H>) {
        tracing::info!(routes = router.len(), "Published router");
        self.current.store(Arc::new(router));
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::*;
    use crate::registry::Macros;
    use crate::routing::Dispatch;

    #[test]
    fn test_publish_swaps_snapshot() {
        let mut first = Router::new(Macros::defaults());
        first.compile(Method::GET, "", "/a", 1u8, "a").unwrap();
        let handle = RouterHandle::new(first);

        let before = handle.load();

        let mut second = Router::new(Macros::defaults());
        second.compile(Method::GET, "", "/b", 2u8, "b").unwrap();
        handle.publish(second);

        assert!(matches!(
            before.dispatch(&Method::GET, "", "/a"),
            Dispatch::Matched(_)
        ));
        let after = handle.load();
        assert!(matches!(
            after.dispatch(&Method::GET, "", "/a"),
            Dispatch::NotFound { .. }
        ));
        assert!(after.route("b").is_some());
    }
}
