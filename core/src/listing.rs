//! Listing Store operations.
//!
//! Listings are immutable once created. Their `isSold` flag is a projection
//! over the order ledger, computed on every read.

use crate::environment::Clock;
use crate::error::{MarketError, Result};
use crate::metrics;
use crate::repository::{ListingRepository, OrderLedger, StoreError};
use crate::types::{Listing, ListingFields, ListingId, ListingView, OrderStatus, Principal};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Builds public image URLs from stored image paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLinks {
    base_url: String,
    placeholder: String,
}

impl ImageLinks {
    /// Creates links rooted at `base_url`, using `placeholder_path` for
    /// listings without an image.
    #[must_use]
    pub fn new(base_url: impl Into<String>, placeholder_path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            placeholder: placeholder_path.into().trim_start_matches('/').to_string(),
        }
    }

    /// Public URL for a stored image path.
    #[must_use]
    pub fn resolve(&self, image: Option<&str>) -> String {
        let path = image
            .map(|p| p.trim().trim_start_matches('/'))
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.placeholder);
        format!("{}/{}", self.base_url, path)
    }
}

impl Default for ImageLinks {
    fn default() -> Self {
        Self::new("http://localhost:5000", "uploads/placeholder-image.jpg")
    }
}

/// Creates and reads listings.
#[derive(Clone)]
pub struct ListingStore {
    listings: Arc<dyn ListingRepository>,
    ledger: Arc<dyn OrderLedger>,
    clock: Arc<dyn Clock>,
    images: ImageLinks,
}

impl ListingStore {
    /// Creates a listing store.
    #[must_use]
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        ledger: Arc<dyn OrderLedger>,
        clock: Arc<dyn Clock>,
        images: ImageLinks,
    ) -> Self {
        Self {
            listings,
            ledger,
            clock,
            images,
        }
    }

    /// Image URL builder used for this store's views.
    #[must_use]
    pub const fn images(&self) -> &ImageLinks {
        &self.images
    }

    /// Creates a listing owned by `seller`.
    ///
    /// # Errors
    ///
    /// - [`MarketError::Forbidden`] if the principal is not a seller
    /// - [`MarketError::Validation`] if required fields are empty or the
    ///   external `dogId` is already in use
    #[tracing::instrument(skip(self, input), fields(seller = %seller.id))]
    pub async fn create_listing(&self, input: ListingFields, seller: Principal) -> Result<Listing> {
        if !seller.is_seller() {
            warn!(role = %seller.role, "Non-seller attempted to create a listing");
            return Err(MarketError::Forbidden(
                "only sellers can create listings".to_string(),
            ));
        }

        let missing = input.missing_fields();
        if !missing.is_empty() {
            warn!(?missing, "Listing rejected, missing fields");
            return Err(MarketError::missing_fields(&missing));
        }

        let dog_id = input
            .dog_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let listing = Listing {
            id: ListingId::new(),
            dog_id,
            breed: input.breed,
            age: input.age,
            gender: input.gender,
            dog_type: input.dog_type,
            health_status: input.health_status,
            vaccinated: input.vaccinated,
            size: input.size,
            color: input.color,
            behavior: input.behavior,
            image: input.image.filter(|path| !path.trim().is_empty()),
            seller_id: seller.id,
            created_at: self.clock.now(),
        };

        match self.listings.insert(listing.clone()).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(what)) => {
                warn!(dog_id = %listing.dog_id, "Duplicate listing identifier");
                return Err(MarketError::Validation {
                    message: format!("{what} is already listed"),
                    fields: vec!["dogId".to_string()],
                });
            }
            Err(e) => return Err(e.into()),
        }

        metrics::record_listing_created();
        info!(listing = %listing.id, dog_id = %listing.dog_id, "Listing created");
        Ok(listing)
    }

    /// A single listing with its derived availability.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the listing does not exist.
    pub async fn get_listing(&self, id: ListingId) -> Result<ListingView> {
        let listing = self
            .listings
            .get(id)
            .await?
            .ok_or_else(|| MarketError::not_found("listing", id))?;

        let is_sold = self
            .ledger
            .find_by_listing(id)
            .await?
            .is_some_and(|order| order.status == OrderStatus::Sold);

        debug!(listing = %id, is_sold, "Listing fetched");
        Ok(self.view(listing, is_sold))
    }

    /// All listings, each annotated with `isSold`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Internal`] if storage fails.
    pub async fn list_listings(&self) -> Result<Vec<ListingView>> {
        let listings = self.listings.list().await?;
        let sold: HashSet<ListingId> = self
            .ledger
            .list()
            .await?
            .into_iter()
            .filter(|order| order.status == OrderStatus::Sold)
            .map(|order| order.listing_id)
            .collect();

        debug!(count = listings.len(), sold = sold.len(), "Listings fetched");
        Ok(listings
            .into_iter()
            .map(|listing| {
                let is_sold = sold.contains(&listing.id);
                self.view(listing, is_sold)
            })
            .collect())
    }

    fn view(&self, listing: Listing, is_sold: bool) -> ListingView {
        ListingView {
            image_url: self.images.resolve(listing.image.as_deref()),
            listing,
            is_sold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_links_resolve_stored_path() {
        let links = ImageLinks::new("http://cdn.example/", "/uploads/none.jpg");
        assert_eq!(
            links.resolve(Some("uploads/rex.jpg")),
            "http://cdn.example/uploads/rex.jpg"
        );
    }

    #[test]
    fn test_image_links_fall_back_to_placeholder() {
        let links = ImageLinks::default();
        let placeholder = "http://localhost:5000/uploads/placeholder-image.jpg";
        assert_eq!(links.resolve(None), placeholder);
        assert_eq!(links.resolve(Some("  ")), placeholder);
    }
}
