//! Order lifecycle engine.
//!
//! Enforces the order state machine, one-order-per-listing arbitration and
//! seller ownership, and broadcasts seller-driven changes after they commit.
//!
//! Every read-modify-write on a listing's order runs while holding that
//! listing's async lock, so two adoption requests (or a cancel racing a sale)
//! on the same listing are serialized. Different listings never contend.

use crate::environment::Clock;
use crate::error::{ConflictReason, MarketError, OrderAction, Result};
use crate::listing::ImageLinks;
use crate::metrics;
use crate::notify::{Notifier, OrderEvent};
use crate::repository::{ListingRepository, OrderLedger, StoreError, UserDirectory};
use crate::types::{
    BuyerContact, Listing, ListingId, ListingSummary, Order, OrderId, OrderStatus, Principal,
    SellerOrderView,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Per-listing async locks.
///
/// Entries are created on demand and pruned once no task holds or waits on them.
#[derive(Debug, Default)]
pub struct ListingLocks {
    locks: Mutex<HashMap<ListingId, Arc<AsyncMutex<()>>>>,
}

impl ListingLocks {
    /// Create an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `listing`.
    pub async fn acquire(&self, listing: ListingId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|id, lock| *id == listing || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(listing).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of listings currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no listing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decides whether a new adoption request may be placed, given the order
/// currently attached to the listing.
///
/// # Errors
///
/// - [`ConflictReason::AlreadySold`] if that order is `sold`
/// - [`ConflictReason::AlreadyReserved`] if it is `pending` or `confirmed`
pub fn arbitrate(existing: Option<&Order>) -> std::result::Result<(), ConflictReason> {
    match existing.map(|order| order.status) {
        None => Ok(()),
        Some(OrderStatus::Sold) => Err(ConflictReason::AlreadySold),
        Some(OrderStatus::Pending | OrderStatus::Confirmed) => Err(ConflictReason::AlreadyReserved),
    }
}

/// Dependencies of the lifecycle engine.
#[derive(Clone)]
pub struct EngineDeps {
    /// Listing storage
    pub listings: Arc<dyn ListingRepository>,
    /// Order storage
    pub ledger: Arc<dyn OrderLedger>,
    /// Account profiles for buyer contact details
    pub users: Arc<dyn UserDirectory>,
    /// Event sink for seller-driven changes
    pub notifier: Arc<dyn Notifier>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Image URL builder for order views
    pub images: ImageLinks,
}

/// The order lifecycle engine.
#[derive(Clone)]
pub struct LifecycleEngine {
    deps: EngineDeps,
    locks: Arc<ListingLocks>,
}

impl LifecycleEngine {
    /// Creates an engine over the given dependencies.
    #[must_use]
    pub fn new(deps: EngineDeps) -> Self {
        Self {
            deps,
            locks: Arc::new(ListingLocks::new()),
        }
    }

    /// Places an adoption request for `listing_id` on behalf of `buyer`.
    ///
    /// The new order starts `pending`. No event is broadcast.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotFound`] if the listing does not exist
    /// - [`MarketError::Forbidden`] if the principal is not a buyer
    /// - [`MarketError::Conflict`] if the listing already has an order
    #[tracing::instrument(skip(self), fields(buyer = %buyer.id))]
    pub async fn request_adoption(&self, listing_id: ListingId, buyer: Principal) -> Result<Order> {
        let started = Instant::now();

        if !buyer.is_buyer() {
            warn!(role = %buyer.role, "Non-buyer attempted an adoption request");
            return Err(MarketError::Forbidden(
                "only buyers can request adoptions".to_string(),
            ));
        }

        self.deps
            .listings
            .get(listing_id)
            .await?
            .ok_or_else(|| MarketError::not_found("listing", listing_id))?;

        let _guard = self.locks.acquire(listing_id).await;

        let existing = self.deps.ledger.find_by_listing(listing_id).await?;
        if let Err(reason) = arbitrate(existing.as_ref()) {
            return Err(conflict(listing_id, reason));
        }

        let order = Order::pending(OrderId::new(), listing_id, buyer.id, self.deps.clock.now());
        match self.deps.ledger.insert(order.clone()).await {
            Ok(()) => {}
            Err(StoreError::ListingTaken(_)) => {
                return Err(conflict(listing_id, ConflictReason::AlreadyReserved));
            }
            Err(e) => return Err(e.into()),
        }

        metrics::record_adoption_request();
        metrics::record_duration("request_adoption", started.elapsed());
        info!(order = %order.id, listing = %listing_id, "Adoption requested");
        Ok(order)
    }

    /// Moves an order to `status` on behalf of the listing's seller.
    ///
    /// Emits `orderUpdated` once the new status is committed.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotFound`] if the order or its listing does not exist
    /// - [`MarketError::Forbidden`] if `seller` does not own the listing
    /// - [`MarketError::InvalidTransition`] if the status graph forbids the move
    #[tracing::instrument(skip(self), fields(seller = %seller.id))]
    pub async fn transition_order(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        seller: Principal,
    ) -> Result<()> {
        let started = Instant::now();
        let (order, _guard) = self.lock_owned_order(order_id, seller).await?;

        if !order.status.can_transition_to(status) {
            warn!(order = %order_id, from = %order.status, to = %status, "Invalid transition");
            return Err(MarketError::InvalidTransition {
                from: order.status,
                action: OrderAction::Transition(status),
            });
        }

        if !self
            .deps
            .ledger
            .update_status(order_id, order.status, status)
            .await?
        {
            let action = OrderAction::Transition(status);
            return Err(self.lost_race(order_id, action).await);
        }

        metrics::record_transition(status);
        metrics::record_duration("transition_order", started.elapsed());
        info!(order = %order_id, from = %order.status, to = %status, "Order transitioned");

        self.deps.notifier.emit(OrderEvent::OrderUpdated {
            order_id,
            status,
            listing_id: order.listing_id,
        });
        Ok(())
    }

    /// Removes a non-terminal order on behalf of the listing's seller.
    ///
    /// Emits `orderDeleted` once the order is removed.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotFound`] if the order or its listing does not exist
    /// - [`MarketError::Forbidden`] if `seller` does not own the listing
    /// - [`MarketError::InvalidTransition`] if the order is already `sold`
    #[tracing::instrument(skip(self), fields(seller = %seller.id))]
    pub async fn cancel_order(&self, order_id: OrderId, seller: Principal) -> Result<()> {
        let (order, _guard) = self.lock_owned_order(order_id, seller).await?;

        if order.status.is_terminal() {
            warn!(order = %order_id, "Attempted to cancel a sold order");
            return Err(MarketError::InvalidTransition {
                from: order.status,
                action: OrderAction::Cancel,
            });
        }

        if !self.deps.ledger.delete(order_id, order.status).await? {
            return Err(self.lost_race(order_id, OrderAction::Cancel).await);
        }

        metrics::record_cancellation();
        info!(order = %order_id, listing = %order.listing_id, "Order cancelled");

        self.deps.notifier.emit(OrderEvent::OrderDeleted {
            order_id,
            listing_id: order.listing_id,
        });
        Ok(())
    }

    /// Checks that `seller` may modify the order, without changing it.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotFound`] if the order or its listing does not exist
    /// - [`MarketError::Forbidden`] if `seller` does not own the listing
    pub async fn check_order_owner(&self, order_id: OrderId, seller: Principal) -> Result<()> {
        let order = self
            .deps
            .ledger
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| MarketError::not_found("order", order_id))?;
        self.ensure_owner(&order, seller).await
    }

    /// Orders on listings owned by `seller`, with listing summary and buyer contact.
    ///
    /// # Errors
    ///
    /// - [`MarketError::Forbidden`] if the principal is not a seller
    /// - [`MarketError::Internal`] if storage fails
    #[tracing::instrument(skip(self), fields(seller = %seller.id))]
    pub async fn list_orders_for_seller(&self, seller: Principal) -> Result<Vec<SellerOrderView>> {
        if !seller.is_seller() {
            warn!(role = %seller.role, "Non-seller attempted to list orders");
            return Err(MarketError::Forbidden(
                "only sellers can access orders".to_string(),
            ));
        }

        let owned: HashMap<ListingId, Listing> = self
            .deps
            .listings
            .list()
            .await?
            .into_iter()
            .filter(|listing| listing.seller_id == seller.id)
            .map(|listing| (listing.id, listing))
            .collect();

        let mut views = Vec::new();
        for order in self.deps.ledger.list().await? {
            let Some(listing) = owned.get(&order.listing_id) else {
                continue;
            };
            let buyer = self
                .deps
                .users
                .get(order.buyer_id)
                .await?
                .map(BuyerContact::from);
            views.push(SellerOrderView {
                id: order.id,
                status: order.status,
                created_at: order.created_at,
                listing: ListingSummary {
                    id: listing.id,
                    dog_id: listing.dog_id.clone(),
                    breed: listing.breed.clone(),
                    image_url: self.deps.images.resolve(listing.image.as_deref()),
                },
                buyer,
            });
        }

        debug!(count = views.len(), "Seller orders listed");
        Ok(views)
    }

    /// Loads an order, locks its listing, re-reads the order under the lock
    /// and checks that `seller` owns the listing.
    async fn lock_owned_order(
        &self,
        order_id: OrderId,
        seller: Principal,
    ) -> Result<(Order, OwnedMutexGuard<()>)> {
        let order = self
            .deps
            .ledger
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| MarketError::not_found("order", order_id))?;

        let guard = self.locks.acquire(order.listing_id).await;

        let order = self
            .deps
            .ledger
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| MarketError::not_found("order", order_id))?;

        self.ensure_owner(&order, seller).await?;
        Ok((order, guard))
    }

    async fn ensure_owner(&self, order: &Order, seller: Principal) -> Result<()> {
        let listing = self
            .deps
            .listings
            .get(order.listing_id)
            .await?
            .ok_or_else(|| MarketError::not_found("listing", order.listing_id))?;

        if listing.seller_id != seller.id {
            warn!(order = %order.id, "Non-owner attempted to modify an order");
            return Err(MarketError::Forbidden(
                "only the listing's seller can modify this order".to_string(),
            ));
        }
        Ok(())
    }

    /// Explains a conditional write that matched no row: another process
    /// removed the order or moved its status after it was read.
    async fn lost_race(&self, order_id: OrderId, action: OrderAction) -> MarketError {
        match self.deps.ledger.find_by_id(order_id).await {
            Ok(Some(current)) => {
                warn!(
                    order = %order_id,
                    from = %current.status,
                    %action,
                    "Order changed concurrently"
                );
                MarketError::InvalidTransition {
                    from: current.status,
                    action,
                }
            }
            Ok(None) => MarketError::not_found("order", order_id),
            Err(e) => e.into(),
        }
    }
}

fn conflict(listing: ListingId, reason: ConflictReason) -> MarketError {
    metrics::record_conflict(reason);
    warn!(%listing, %reason, "Adoption request rejected");
    MarketError::Conflict(reason)
}
