//! Order endpoints.
//!
//! - POST   /api/orders     - Request adoption of a listing (buyers)
//! - GET    /api/orders     - Orders on the caller's listings (sellers)
//! - PUT    /api/orders/:id - Move an order to a new status (owning seller)
//! - DELETE /api/orders/:id - Cancel an order (owning seller)

use crate::error::AppError;
use crate::extractors::{Authenticated, JsonBody};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use dogworld_core::types::{ListingId, OrderId, OrderStatus, SellerOrderView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to adopt a listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Listing to adopt. Older clients send it as `dogId`.
    #[serde(alias = "dogId")]
    pub listing_id: ListingId,
}

/// Response after placing an adoption request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    /// Always `true`
    pub success: bool,
    /// The new order
    pub order_id: OrderId,
}

/// Request to change an order's status.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    /// Target status
    pub status: String,
}

/// Bare acknowledgement.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Always `true`
    pub success: bool,
}

const OK: SuccessResponse = SuccessResponse { success: true };

fn parse_order_id(raw: &str) -> Result<OrderId, AppError> {
    Uuid::parse_str(raw)
        .map(OrderId::from_uuid)
        .map_err(|_| AppError::not_found("Order", raw))
}

/// Place an adoption request for a listing.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/orders \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"listingId":"<uuid>"}'
/// ```
#[tracing::instrument(skip(state, request))]
pub async fn create_order(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let order = state
        .engine
        .request_adoption(request.listing_id, caller)
        .await?;
    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: order.id,
    }))
}

/// Orders on the caller's listings, with listing summary and buyer contact.
#[tracing::instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Result<Json<Vec<SellerOrderView>>, AppError> {
    let orders = state.engine.list_orders_for_seller(caller).await?;
    Ok(Json(orders))
}

/// Move an order to a new status.
#[tracing::instrument(skip(state, request))]
pub async fn update_order(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateOrderRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let order_id = parse_order_id(&id)?;
    let status = match request.status.parse::<OrderStatus>() {
        Ok(status) => status,
        Err(e) => {
            // Only the owning seller learns that the status was malformed.
            state.engine.check_order_owner(order_id, caller).await?;
            return Err(AppError::validation(e.to_string()));
        }
    };

    state
        .engine
        .transition_order(order_id, status, caller)
        .await?;
    Ok(Json(OK))
}

/// Cancel an order.
#[tracing::instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let order_id = parse_order_id(&id)?;
    state.engine.cancel_order(order_id, caller).await?;
    Ok(Json(OK))
}
