//! Domain types for the adoption marketplace.
//!
//! Listings are dogs offered by sellers; orders are buyers' adoption requests
//! against a listing. A listing's availability is never stored: it is derived
//! from the order ledger (a listing is sold iff one of its orders is `sold`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Internal storage key of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Creates a new random `ListingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ListingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an adoption request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier issued by the identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Principals
// ============================================================================

/// Marketplace role of an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Places adoption requests. Legacy account records call this role `user`.
    #[serde(alias = "user")]
    Buyer,
    /// Lists dogs and moves their orders through the workflow.
    Seller,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified caller identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account identifier
    pub id: UserId,
    /// Role the account acts in
    pub role: Role,
}

impl Principal {
    /// Creates a buyer principal.
    #[must_use]
    pub const fn buyer(id: UserId) -> Self {
        Self {
            id,
            role: Role::Buyer,
        }
    }

    /// Creates a seller principal.
    #[must_use]
    pub const fn seller(id: UserId) -> Self {
        Self {
            id,
            role: Role::Seller,
        }
    }

    /// Whether the principal acts as a seller.
    #[must_use]
    pub const fn is_seller(&self) -> bool {
        matches!(self.role, Role::Seller)
    }

    /// Whether the principal acts as a buyer.
    #[must_use]
    pub const fn is_buyer(&self) -> bool {
        matches!(self.role, Role::Buyer)
    }
}

/// Profile details of an account, used to put buyers in touch with sellers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account identifier
    pub id: UserId,
    /// Account role
    pub role: Role,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Optional phone number or other contact handle
    #[serde(default)]
    pub contact: Option<String>,
}

// ============================================================================
// Orders
// ============================================================================

/// Status of an adoption request.
///
/// ```text
/// pending ──► confirmed ──► sold
///    └─────────────────────►┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Request placed, waiting for the seller
    Pending,
    /// Seller accepted the request
    Confirmed,
    /// Adoption completed (terminal)
    Sold,
}

impl OrderStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Sold => "sold",
        }
    }

    /// `sold` is the only terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Sold)
    }

    /// Whether a seller may move an order from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Sold) | (Self::Confirmed, Self::Sold)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown order status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "sold" => Ok(Self::Sold),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One buyer's adoption request against one listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Listing the request is for
    pub listing_id: ListingId,
    /// Buyer who placed the request
    pub buyer_id: UserId,
    /// Current status
    pub status: OrderStatus,
    /// When the request was placed
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new `pending` order.
    #[must_use]
    pub const fn pending(
        id: OrderId,
        listing_id: ListingId,
        buyer_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            listing_id,
            buyer_id,
            status: OrderStatus::Pending,
            created_at,
        }
    }
}

// ============================================================================
// Listings
// ============================================================================

/// Seller-supplied description of a dog.
///
/// Field names follow the marketplace's JSON API. Every descriptive field is
/// required; absent fields deserialize as empty and are reported by
/// [`ListingFields::missing_fields`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingFields {
    /// External identifier; generated when absent
    pub dog_id: Option<String>,
    /// Breed
    pub breed: String,
    /// Age bucket, e.g. "2 years"
    pub age: String,
    /// Gender
    pub gender: String,
    /// Origin: "Home Dog" or "Street Dog"
    pub dog_type: String,
    /// Health status
    pub health_status: String,
    /// Vaccination flag ("Yes"/"No")
    pub vaccinated: String,
    /// Size
    pub size: String,
    /// Coat color
    pub color: String,
    /// Behavior tag
    pub behavior: String,
    /// Path of an already-uploaded image
    pub image: Option<String>,
}

impl ListingFields {
    /// Names of required fields that are empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("breed", &self.breed),
            ("age", &self.age),
            ("gender", &self.gender),
            ("dogType", &self.dog_type),
            ("healthStatus", &self.health_status),
            ("vaccinated", &self.vaccinated),
            ("size", &self.size),
            ("color", &self.color),
            ("behavior", &self.behavior),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A dog offered for adoption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Internal storage key
    pub id: ListingId,
    /// External identifier shown to users
    pub dog_id: String,
    /// Breed
    pub breed: String,
    /// Age bucket
    pub age: String,
    /// Gender
    pub gender: String,
    /// Origin type (home/street)
    pub dog_type: String,
    /// Health status
    pub health_status: String,
    /// Vaccination flag
    pub vaccinated: String,
    /// Size
    pub size: String,
    /// Color
    pub color: String,
    /// Behavior tag
    pub behavior: String,
    /// Stored image path, if any
    #[serde(rename = "imagePath")]
    pub image: Option<String>,
    /// Owning seller
    pub seller_id: UserId,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A listing as returned to clients, with derived availability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    /// The stored listing
    #[serde(flatten)]
    pub listing: Listing,
    /// Public URL of the image (or the placeholder)
    #[serde(rename = "image")]
    pub image_url: String,
    /// Whether an order for this listing reached `sold`
    pub is_sold: bool,
}

/// Listing details shown alongside a seller's orders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    /// Internal listing key
    pub id: ListingId,
    /// External identifier
    pub dog_id: String,
    /// Breed
    pub breed: String,
    /// Public image URL
    #[serde(rename = "image")]
    pub image_url: String,
}

/// How a seller can reach the buyer of an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuyerContact {
    /// Buyer name
    pub name: String,
    /// Buyer email
    pub email: String,
    /// Optional contact handle
    pub contact: Option<String>,
}

impl From<UserProfile> for BuyerContact {
    fn from(profile: UserProfile) -> Self {
        Self {
            name: profile.name,
            email: profile.email,
            contact: profile.contact,
        }
    }
}

/// An order as listed on the seller dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOrderView {
    /// Order identifier
    pub id: OrderId,
    /// Current status
    pub status: OrderStatus,
    /// When the request was placed
    pub created_at: DateTime<Utc>,
    /// The listing the order is for
    pub listing: ListingSummary,
    /// Buyer contact; absent if the buyer's profile is unknown
    pub buyer: Option<BuyerContact>,
}
