//! # DogWorld Testing
//!
//! Testing utilities for the DogWorld marketplace.
//!
//! This crate provides:
//! - Mock implementations of injected dependencies (clock, notifier)
//! - A [`Marketplace`](fixtures::Marketplace) fixture wiring the engine over
//!   in-memory storage with a seller and a buyer already registered
//! - proptest strategies for domain types
//!
//! ## Example
//!
//! ```
//! use dogworld_testing::fixtures::Marketplace;
//!
//! # async fn example() {
//! let market = Marketplace::new();
//! let listing = market.listing().await;
//! let order = market
//!     .engine
//!     .request_adoption(listing.id, market.buyer)
//!     .await
//!     .unwrap();
//! assert_eq!(market.ledger.len(), 1);
//! # let _ = order;
//! # }
//! ```

use chrono::{DateTime, Utc};
use dogworld_core::environment::Clock;

/// Mock implementations of injected dependencies.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use dogworld_core::notify::{Notifier, OrderEvent};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use dogworld_testing::mocks::FixedClock;
    /// use dogworld_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Notifier that records every emitted event.
    ///
    /// Clones share the same recording.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        events: Arc<Mutex<Vec<OrderEvent>>>,
    }

    impl RecordingNotifier {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Events emitted so far, in order.
        #[must_use]
        pub fn events(&self) -> Vec<OrderEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Number of events emitted so far.
        #[must_use]
        pub fn len(&self) -> usize {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Whether nothing was emitted.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl Notifier for RecordingNotifier {
        fn emit(&self, event: OrderEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}

/// Ready-made marketplace wiring for tests.
pub mod fixtures {
    use super::mocks::{FixedClock, RecordingNotifier, test_clock};
    use dogworld_core::lifecycle::{EngineDeps, LifecycleEngine};
    use dogworld_core::listing::{ImageLinks, ListingStore};
    use dogworld_core::memory::{
        InMemoryListingRepository, InMemoryOrderLedger, InMemoryUserDirectory,
    };
    use dogworld_core::types::{
        Listing, ListingFields, Principal, Role, UserId, UserProfile,
    };
    use std::sync::Arc;

    /// Image base URL used by fixtures.
    pub const BASE_URL: &str = "http://dogs.test";

    /// A complete, valid set of listing fields.
    #[must_use]
    pub fn listing_fields(breed: &str) -> ListingFields {
        ListingFields {
            dog_id: None,
            breed: breed.to_string(),
            age: "1 year".to_string(),
            gender: "Female".to_string(),
            dog_type: "Street Dog".to_string(),
            health_status: "Healthy".to_string(),
            vaccinated: "Yes".to_string(),
            size: "Small".to_string(),
            color: "Black".to_string(),
            behavior: "Playful".to_string(),
            image: None,
        }
    }

    /// A profile for `id` with the given role and name.
    #[must_use]
    pub fn profile(id: UserId, role: Role, name: &str) -> UserProfile {
        UserProfile {
            id,
            role,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            contact: Some("+1 555 0100".to_string()),
        }
    }

    /// In-memory marketplace with one seller and one buyer registered.
    ///
    /// Storage handles are exposed so tests can inspect state directly.
    #[derive(Clone)]
    pub struct Marketplace {
        /// Lifecycle engine under test
        pub engine: LifecycleEngine,
        /// Listing store under test
        pub store: ListingStore,
        /// Listing storage
        pub listings: Arc<InMemoryListingRepository>,
        /// Order storage
        pub ledger: Arc<InMemoryOrderLedger>,
        /// Account profiles
        pub users: Arc<InMemoryUserDirectory>,
        /// Recorded notifications
        pub notifier: RecordingNotifier,
        /// Registered seller
        pub seller: Principal,
        /// Registered buyer
        pub buyer: Principal,
    }

    impl Marketplace {
        /// Builds a marketplace on the fixed test clock.
        #[must_use]
        pub fn new() -> Self {
            Self::with_clock(test_clock())
        }

        /// Builds a marketplace on the given clock.
        #[must_use]
        pub fn with_clock(clock: FixedClock) -> Self {
            let seller = Principal::seller(UserId::new());
            let buyer = Principal::buyer(UserId::new());

            let listings = Arc::new(InMemoryListingRepository::new());
            let ledger = Arc::new(InMemoryOrderLedger::new());
            let users = Arc::new(InMemoryUserDirectory::new([
                profile(seller.id, Role::Seller, "Kennel"),
                profile(buyer.id, Role::Buyer, "Ada"),
            ]));
            let notifier = RecordingNotifier::new();
            let clock = Arc::new(clock);
            let images = ImageLinks::new(BASE_URL, "uploads/placeholder-image.jpg");

            let store = ListingStore::new(
                listings.clone(),
                ledger.clone(),
                clock.clone(),
                images.clone(),
            );
            let engine = LifecycleEngine::new(EngineDeps {
                listings: listings.clone(),
                ledger: ledger.clone(),
                users: users.clone(),
                notifier: Arc::new(notifier.clone()),
                clock,
                images,
            });

            Self {
                engine,
                store,
                listings,
                ledger,
                users,
                notifier,
                seller,
                buyer,
            }
        }

        /// Registers another seller.
        #[must_use]
        pub fn add_seller(&self, name: &str) -> Principal {
            self.add_user(Role::Seller, name)
        }

        /// Registers another buyer.
        #[must_use]
        pub fn add_buyer(&self, name: &str) -> Principal {
            self.add_user(Role::Buyer, name)
        }

        #[allow(clippy::expect_used)]
        fn add_user(&self, role: Role, name: &str) -> Principal {
            let principal = Principal {
                id: UserId::new(),
                role,
            };
            self.users
                .upsert(profile(principal.id, role, name))
                .expect("in-memory directory should accept profiles");
            principal
        }

        /// Creates a listing owned by the fixture's seller.
        ///
        /// # Panics
        ///
        /// Panics if the listing cannot be created.
        pub async fn listing(&self) -> Listing {
            self.listing_for(self.seller, "Labrador").await
        }

        /// Creates a listing of `breed` owned by `seller`.
        ///
        /// # Panics
        ///
        /// Panics if the listing cannot be created.
        #[allow(clippy::expect_used)]
        pub async fn listing_for(&self, seller: Principal, breed: &str) -> Listing {
            self.store
                .create_listing(listing_fields(breed), seller)
                .await
                .expect("fixture listing should be valid")
        }
    }

    impl Default for Marketplace {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use dogworld_core::types::OrderStatus;
    use proptest::prelude::*;

    /// Any order status.
    pub fn order_status() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Pending),
            Just(OrderStatus::Confirmed),
            Just(OrderStatus::Sold),
        ]
    }

    /// Sequences of seller actions: `Some(status)` transitions, `None` cancels.
    pub fn seller_actions(max: usize) -> impl Strategy<Value = Vec<Option<OrderStatus>>> {
        proptest::collection::vec(proptest::option::of(order_status()), 0..=max)
    }
}

/// Installs a test tracing subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, RecordingNotifier, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use dogworld_core::notify::{Notifier, OrderEvent};
    use dogworld_core::types::{ListingId, OrderId};

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_recording_notifier_shares_recording() {
        let notifier = RecordingNotifier::new();
        let clone = notifier.clone();
        clone.emit(OrderEvent::OrderDeleted {
            order_id: OrderId::new(),
            listing_id: ListingId::new(),
        });
        assert_eq!(notifier.len(), 1);
    }
}
