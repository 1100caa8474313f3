//! Storage seams: listings, the order ledger, and account profiles.
//!
//! The traits return boxed futures so they can be used as trait objects
//! (`Arc<dyn OrderLedger>`) by the engine and the web layer. Implementations
//! live in [`crate::memory`] and in the `dogworld-postgres` crate.

use crate::types::{Listing, ListingId, Order, OrderId, OrderStatus, UserId, UserProfile};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors reported by storage backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another order already references the listing
    #[error("listing {0} already has an order")]
    ListingTaken(ListingId),

    /// A unique attribute is already in use
    #[error("duplicate value: {0}")]
    Duplicate(String),

    /// The backend failed
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Boxed future returned by storage operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Listing storage. Listings are never updated or deleted.
pub trait ListingRepository: Send + Sync {
    /// Stores a new listing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the external `dogId` is already used.
    fn insert(&self, listing: Listing) -> StoreFuture<'_, ()>;

    /// Looks up a listing by its storage key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn get(&self, id: ListingId) -> StoreFuture<'_, Option<Listing>>;

    /// All listings, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn list(&self) -> StoreFuture<'_, Vec<Listing>>;
}

/// Order storage and query primitives.
///
/// The ledger holds at most one order per listing; `insert` enforces it.
pub trait OrderLedger: Send + Sync {
    /// The order referencing a listing, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn find_by_listing(&self, listing: ListingId) -> StoreFuture<'_, Option<Order>>;

    /// Looks up an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn find_by_id(&self, id: OrderId) -> StoreFuture<'_, Option<Order>>;

    /// All orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn list(&self) -> StoreFuture<'_, Vec<Order>>;

    /// Stores a new order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ListingTaken`] if another order already
    /// references the same listing.
    fn insert(&self, order: Order) -> StoreFuture<'_, ()>;

    /// Sets an order's status if it is still `expected`.
    ///
    /// Returns `false` if the order does not exist or its status has moved
    /// on; callers re-read the order to tell the two apart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> StoreFuture<'_, bool>;

    /// Removes an order if its status is still `expected`.
    ///
    /// Returns `false` if the order does not exist or its status has moved on.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn delete(&self, id: OrderId, expected: OrderStatus) -> StoreFuture<'_, bool>;
}

/// Read-only account profile lookup.
pub trait UserDirectory: Send + Sync {
    /// Profile of an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    fn get(&self, id: UserId) -> StoreFuture<'_, Option<UserProfile>>;
}
