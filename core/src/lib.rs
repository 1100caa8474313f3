//! # DogWorld Core
//!
//! Order lifecycle and listing-availability engine for the DogWorld adoption
//! marketplace.
//!
//! Sellers list dogs; buyers place adoption requests ("orders") against
//! listings; sellers move each order through `pending → confirmed → sold` or
//! cancel it. At most one order exists per listing at any time, and a listing
//! whose order reached `sold` can never be requested again.
//!
//! ## Components
//!
//! - [`listing::ListingStore`]: creates and reads listings, deriving `isSold`
//! - [`lifecycle::LifecycleEngine`]: arbitration, transitions, authorization
//! - [`notify::BroadcastNotifier`]: fan-out of seller-driven order changes
//! - [`identity`]: bearer-token verification against a static account table
//! - [`repository`]: storage traits, with in-memory backends in [`memory`]
//!
//! ## Example
//!
//! ```
//! use dogworld_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> dogworld_core::error::Result<()> {
//! let listings = Arc::new(InMemoryListingRepository::new());
//! let ledger = Arc::new(InMemoryOrderLedger::new());
//! let clock = Arc::new(SystemClock);
//!
//! let store = ListingStore::new(
//!     listings.clone(),
//!     ledger.clone(),
//!     clock.clone(),
//!     ImageLinks::default(),
//! );
//! let engine = LifecycleEngine::new(EngineDeps {
//!     listings,
//!     ledger,
//!     users: Arc::new(InMemoryUserDirectory::default()),
//!     notifier: Arc::new(BroadcastNotifier::default()),
//!     clock,
//!     images: ImageLinks::default(),
//! });
//!
//! let seller = Principal::seller(UserId::new());
//! let buyer = Principal::buyer(UserId::new());
//! seed_default_listings(&store, seller).await?;
//!
//! let listing = store.list_listings().await?[0].listing.id;
//! let order = engine.request_adoption(listing, buyer).await?;
//! engine.transition_order(order.id, OrderStatus::Sold, seller).await?;
//!
//! assert!(store.get_listing(listing).await?.is_sold);
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod listing;
pub mod memory;
pub mod metrics;
pub mod notify;
pub mod repository;
pub mod seed;
pub mod types;

/// Commonly used items.
pub mod prelude {
    pub use crate::environment::{Clock, SystemClock};
    pub use crate::error::{ConflictReason, MarketError, OrderAction};
    pub use crate::identity::{
        AccountTable, IdentityError, IdentityProvider, StaticIdentityProvider,
    };
    pub use crate::lifecycle::{EngineDeps, LifecycleEngine, arbitrate};
    pub use crate::listing::{ImageLinks, ListingStore};
    pub use crate::memory::{
        InMemoryListingRepository, InMemoryOrderLedger, InMemoryUserDirectory,
    };
    pub use crate::notify::{BroadcastNotifier, Notifier, Observer, OrderEvent};
    pub use crate::repository::{ListingRepository, OrderLedger, StoreError, UserDirectory};
    pub use crate::seed::seed_default_listings;
    pub use crate::types::{
        Listing, ListingFields, ListingId, ListingView, Order, OrderId, OrderStatus, Principal,
        Role, SellerOrderView, UserId, UserProfile,
    };
}
