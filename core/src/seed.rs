//! Default listings for a fresh marketplace.

use crate::error::Result;
use crate::listing::ListingStore;
use crate::types::{ListingFields, Principal};
use tracing::info;

fn default_listings() -> [ListingFields; 2] {
    let field = String::from;
    [
        ListingFields {
            dog_id: None,
            breed: field("Labrador"),
            age: field("2 years"),
            gender: field("Male"),
            dog_type: field("Home Dog"),
            health_status: field("Healthy"),
            vaccinated: field("Yes"),
            size: field("Large"),
            color: field("Yellow"),
            behavior: field("Friendly"),
            image: None,
        },
        ListingFields {
            dog_id: None,
            breed: field("Beagle"),
            age: field("3 years"),
            gender: field("Female"),
            dog_type: field("Home Dog"),
            health_status: field("Healthy"),
            vaccinated: field("Yes"),
            size: field("Medium"),
            color: field("Brown"),
            behavior: field("Calm"),
            image: None,
        },
    ]
}

/// Inserts the default Labrador and Beagle listings owned by `seller` when
/// the store holds no listings. Returns how many listings were added.
///
/// # Errors
///
/// Propagates errors from listing creation.
pub async fn seed_default_listings(store: &ListingStore, seller: Principal) -> Result<usize> {
    if !store.list_listings().await?.is_empty() {
        info!("Listings present, skipping seed");
        return Ok(0);
    }

    let mut added = 0;
    for fields in default_listings() {
        store.create_listing(fields, seller).await?;
        added += 1;
    }
    info!(added, "Default listings seeded");
    Ok(added)
}
