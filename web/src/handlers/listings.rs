//! Listing endpoints.
//!
//! - GET  /api/listings     - All listings with `isSold`
//! - GET  /api/listings/:id - One listing with `isSold`
//! - POST /api/listings     - Create a listing (sellers only)

use crate::error::AppError;
use crate::extractors::{Authenticated, JsonBody};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use dogworld_core::types::{ListingFields, ListingId, ListingView};
use serde::Serialize;
use uuid::Uuid;

/// Response after creating a listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingResponse {
    /// Always `true`
    pub success: bool,
    /// External identifier of the new listing
    pub dog_id: String,
    /// Storage key of the new listing
    pub id: ListingId,
}

/// Parses a listing path segment. Malformed ids cannot exist, so they are
/// reported as not found.
fn parse_listing_id(raw: &str) -> Result<ListingId, AppError> {
    Uuid::parse_str(raw)
        .map(ListingId::from_uuid)
        .map_err(|_| AppError::not_found("Listing", raw))
}

/// List every listing.
///
/// ```bash
/// curl http://localhost:8080/api/listings -H "Authorization: Bearer <token>"
/// ```
#[tracing::instrument(skip(state, _caller))]
pub async fn list_listings(
    State(state): State<AppState>,
    _caller: Authenticated,
) -> Result<Json<Vec<ListingView>>, AppError> {
    let listings = state.listings.list_listings().await?;
    Ok(Json(listings))
}

/// Fetch one listing.
#[tracing::instrument(skip(state, _caller))]
pub async fn get_listing(
    State(state): State<AppState>,
    _caller: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ListingView>, AppError> {
    let id = parse_listing_id(&id)?;
    let listing = state.listings.get_listing(id).await?;
    Ok(Json(listing))
}

/// Create a listing owned by the calling seller.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/listings \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"breed":"Labrador","age":"2 years","gender":"Male","dogType":"Home Dog",
///        "healthStatus":"Healthy","vaccinated":"Yes","size":"Large",
///        "color":"Yellow","behavior":"Friendly"}'
/// ```
#[tracing::instrument(skip(state, body))]
pub async fn create_listing(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    JsonBody(body): JsonBody<ListingFields>,
) -> Result<Json<CreateListingResponse>, AppError> {
    let listing = state.listings.create_listing(body, caller).await?;
    Ok(Json(CreateListingResponse {
        success: true,
        dog_id: listing.dog_id,
        id: listing.id,
    }))
}
