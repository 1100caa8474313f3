//! Database row shapes and their conversion into domain types.

use chrono::{DateTime, Utc};
use dogworld_core::repository::StoreError;
use dogworld_core::types::{
    Listing, ListingId, Order, OrderId, OrderStatus, Role, UserId, UserProfile,
};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ListingRow {
    id: Uuid,
    dog_id: String,
    breed: String,
    age: String,
    gender: String,
    dog_type: String,
    health_status: String,
    vaccinated: String,
    size: String,
    color: String,
    behavior: String,
    image: Option<String>,
    seller_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Self {
            id: ListingId::from_uuid(row.id),
            dog_id: row.dog_id,
            breed: row.breed,
            age: row.age,
            gender: row.gender,
            dog_type: row.dog_type,
            health_status: row.health_status,
            vaccinated: row.vaccinated,
            size: row.size,
            color: row.color,
            behavior: row.behavior,
            image: row.image,
            seller_id: UserId::from_uuid(row.seller_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    id: Uuid,
    listing_id: Uuid,
    buyer_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Backend(format!("order {}: {e}", row.id)))?;
        Ok(Self {
            id: OrderId::from_uuid(row.id),
            listing_id: ListingId::from_uuid(row.listing_id),
            buyer_id: UserId::from_uuid(row.buyer_id),
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    role: String,
    name: String,
    email: String,
    contact: Option<String>,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = match row.role.as_str() {
            "seller" => Role::Seller,
            "buyer" | "user" => Role::Buyer,
            other => {
                return Err(StoreError::Backend(format!(
                    "user {}: unknown role {other}",
                    row.id
                )));
            }
        };
        Ok(Self {
            id: UserId::from_uuid(row.id),
            role,
            name: row.name,
            email: row.email,
            contact: row.contact,
        })
    }
}
