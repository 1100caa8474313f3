//! Router configuration.

use crate::handlers::{health, listings, orders, websocket};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// ```text
/// GET    /health
/// GET    /ws
/// GET    /api/listings
/// POST   /api/listings
/// GET    /api/listings/:id
/// GET    /api/orders
/// POST   /api/orders
/// PUT    /api/orders/:id
/// DELETE /api/orders/:id
/// ```
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/listings",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route("/listings/:id", get(listings::get_listing))
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/orders/:id",
            put(orders::update_order).delete(orders::delete_order),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ws", get(websocket::handle))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
