//! In-memory storage backends.
//!
//! Used when no database is configured and by the test suites. Each store is
//! cheap to clone; clones share the same data.

use crate::repository::{ListingRepository, OrderLedger, StoreError, StoreFuture, UserDirectory};
use crate::types::{Listing, ListingId, Order, OrderId, OrderStatus, UserId, UserProfile};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

/// `HashMap`-backed listing storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryListingRepository {
    listings: Arc<RwLock<HashMap<ListingId, Listing>>>,
}

impl InMemoryListingRepository {
    /// Create a new empty listing store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_sync(&self, listing: Listing) -> Result<(), StoreError> {
        let mut listings = self.listings.write().map_err(poisoned)?;
        if listings.values().any(|l| l.dog_id == listing.dog_id) {
            return Err(StoreError::Duplicate(format!("dogId {}", listing.dog_id)));
        }
        listings.insert(listing.id, listing);
        Ok(())
    }

    fn list_sync(&self) -> Result<Vec<Listing>, StoreError> {
        let listings = self.listings.read().map_err(poisoned)?;
        let mut all: Vec<Listing> = listings.values().cloned().collect();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.dog_id.cmp(&b.dog_id))
        });
        Ok(all)
    }
}

impl ListingRepository for InMemoryListingRepository {
    fn insert(&self, listing: Listing) -> StoreFuture<'_, ()> {
        let result = self.insert_sync(listing);
        Box::pin(async move { result })
    }

    fn get(&self, id: ListingId) -> StoreFuture<'_, Option<Listing>> {
        let result = self
            .listings
            .read()
            .map(|listings| listings.get(&id).cloned())
            .map_err(poisoned);
        Box::pin(async move { result })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Listing>> {
        let result = self.list_sync();
        Box::pin(async move { result })
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    orders: HashMap<OrderId, Order>,
    by_listing: HashMap<ListingId, OrderId>,
}

/// `HashMap`-backed order ledger with a per-listing uniqueness index.
#[derive(Clone, Debug, Default)]
pub struct InMemoryOrderLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryOrderLedger {
    /// Create a new empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map_or(0, |state| state.orders.len())
    }

    /// Whether the ledger holds no orders
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find_by_listing_sync(&self, listing: ListingId) -> Result<Option<Order>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .by_listing
            .get(&listing)
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    fn list_sync(&self) -> Result<Vec<Order>, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        let mut all: Vec<Order> = state.orders.values().cloned().collect();
        all.sort_by_key(|order| order.created_at);
        Ok(all)
    }

    fn insert_sync(&self, order: Order) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.by_listing.contains_key(&order.listing_id) {
            return Err(StoreError::ListingTaken(order.listing_id));
        }
        state.by_listing.insert(order.listing_id, order.id);
        state.orders.insert(order.id, order);
        Ok(())
    }

    fn update_status_sync(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        match state.orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete_sync(&self, id: OrderId, expected: OrderStatus) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if !state
            .orders
            .get(&id)
            .is_some_and(|order| order.status == expected)
        {
            return Ok(false);
        }
        let Some(order) = state.orders.remove(&id) else {
            return Ok(false);
        };
        state.by_listing.remove(&order.listing_id);
        Ok(true)
    }
}

impl OrderLedger for InMemoryOrderLedger {
    fn find_by_listing(&self, listing: ListingId) -> StoreFuture<'_, Option<Order>> {
        let result = self.find_by_listing_sync(listing);
        Box::pin(async move { result })
    }

    fn find_by_id(&self, id: OrderId) -> StoreFuture<'_, Option<Order>> {
        let result = self
            .state
            .read()
            .map(|state| state.orders.get(&id).cloned())
            .map_err(poisoned);
        Box::pin(async move { result })
    }

    fn list(&self) -> StoreFuture<'_, Vec<Order>> {
        let result = self.list_sync();
        Box::pin(async move { result })
    }

    fn insert(&self, order: Order) -> StoreFuture<'_, ()> {
        let result = self.insert_sync(order);
        Box::pin(async move { result })
    }

    fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        status: OrderStatus,
    ) -> StoreFuture<'_, bool> {
        let result = self.update_status_sync(id, expected, status);
        Box::pin(async move { result })
    }

    fn delete(&self, id: OrderId, expected: OrderStatus) -> StoreFuture<'_, bool> {
        let result = self.delete_sync(id, expected);
        Box::pin(async move { result })
    }
}

/// Fixed set of account profiles.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserDirectory {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryUserDirectory {
    /// Create a directory from a set of profiles
    #[must_use]
    pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let profiles = profiles.into_iter().map(|p| (p.id, p)).collect();
        Self {
            profiles: Arc::new(RwLock::new(profiles)),
        }
    }

    /// Adds or replaces a profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the lock is poisoned.
    pub fn upsert(&self, profile: UserProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .map_err(poisoned)?
            .insert(profile.id, profile);
        Ok(())
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get(&self, id: UserId) -> StoreFuture<'_, Option<UserProfile>> {
        let result = self
            .profiles
            .read()
            .map(|profiles| profiles.get(&id).cloned())
            .map_err(poisoned);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn order(listing: ListingId) -> Order {
        Order::pending(
            OrderId::new(),
            listing,
            UserId::new(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_ledger_rejects_second_order_for_listing() {
        let ledger = InMemoryOrderLedger::new();
        let listing = ListingId::new();

        ledger.insert(order(listing)).await.unwrap();
        let err = ledger.insert(order(listing)).await.unwrap_err();

        assert_eq!(err, StoreError::ListingTaken(listing));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_frees_listing() {
        let ledger = InMemoryOrderLedger::new();
        let listing = ListingId::new();
        let first = order(listing);
        let first_id = first.id;

        ledger.insert(first).await.unwrap();
        assert!(ledger.delete(first_id, OrderStatus::Pending).await.unwrap());
        assert!(!ledger.delete(first_id, OrderStatus::Pending).await.unwrap());
        assert!(ledger.find_by_listing(listing).await.unwrap().is_none());

        ledger.insert(order(listing)).await.unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_of_missing_order() {
        let ledger = InMemoryOrderLedger::new();
        let updated = ledger
            .update_status(OrderId::new(), OrderStatus::Pending, OrderStatus::Sold)
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_writes_require_the_expected_status() {
        let ledger = InMemoryOrderLedger::new();
        let listing = ListingId::new();
        let placed = order(listing);
        let id = placed.id;
        ledger.insert(placed).await.unwrap();

        assert!(
            ledger
                .update_status(id, OrderStatus::Pending, OrderStatus::Sold)
                .await
                .unwrap()
        );
        assert!(
            !ledger
                .update_status(id, OrderStatus::Pending, OrderStatus::Confirmed)
                .await
                .unwrap()
        );
        assert!(!ledger.delete(id, OrderStatus::Pending).await.unwrap());

        let stored = ledger.find_by_listing(listing).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Sold);
        assert_eq!(ledger.len(), 1);
    }
}
