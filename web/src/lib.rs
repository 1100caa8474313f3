//! HTTP shell for the DogWorld marketplace.
//!
//! Thin Axum layer over `dogworld-core`: handlers parse requests, resolve the
//! caller from the bearer token, call into the listing store or lifecycle
//! engine, and map [`MarketError`](dogworld_core::error::MarketError)s onto
//! HTTP responses through [`AppError`].
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Axum shell (this crate)      │  ← routing, JSON, auth header
//! │  CorsLayer → TraceLayer → correlation   │  ← observability
//! ├─────────────────────────────────────────┤
//! │            dogworld-core                │
//! │  ListingStore · LifecycleEngine         │  ← rules and arbitration
//! │  BroadcastNotifier                      │  ← /ws fan-out
//! └─────────────────────────────────────────┘
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{Authenticated, BearerToken, JsonBody};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;
