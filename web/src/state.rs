//! Application state for Axum handlers.

use axum::extract::FromRef;
use dogworld_core::identity::IdentityProvider;
use dogworld_core::lifecycle::LifecycleEngine;
use dogworld_core::listing::ListingStore;
use dogworld_core::notify::BroadcastNotifier;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Built once at startup; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Order lifecycle engine
    pub engine: LifecycleEngine,
    /// Listing reads and writes
    pub listings: ListingStore,
    /// Bearer-token verification
    pub identity: Arc<dyn IdentityProvider>,
    /// Observer registry for the notification WebSocket
    pub notifier: BroadcastNotifier,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        engine: LifecycleEngine,
        listings: ListingStore,
        identity: Arc<dyn IdentityProvider>,
        notifier: BroadcastNotifier,
    ) -> Self {
        Self {
            engine,
            listings,
            identity,
            notifier,
        }
    }
}

impl FromRef<AppState> for Arc<dyn IdentityProvider> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.identity)
    }
}

impl FromRef<AppState> for BroadcastNotifier {
    fn from_ref(state: &AppState) -> Self {
        state.notifier.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync>() {}
        assert_clone::<AppState>();
    }
}
