//! HTTP API tests against an in-memory marketplace.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use dogworld_core::identity::AccountTable;
use dogworld_core::notify::BroadcastNotifier;
use dogworld_core::types::Role;
use dogworld_testing::fixtures::{Marketplace, profile};
use dogworld_web::{AppState, CORRELATION_ID_HEADER, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SELLER_TOKEN: &str = "seller-token";
const BUYER_TOKEN: &str = "buyer-token";
const RIVAL_TOKEN: &str = "rival-token";

struct TestApp {
    router: Router,
    market: Marketplace,
}

impl TestApp {
    fn new() -> Self {
        dogworld_testing::init_test_tracing();
        let market = Marketplace::new();
        let rival = market.add_seller("Rival");

        let accounts = AccountTable::default()
            .with_account(profile(market.seller.id, Role::Seller, "Kennel"), SELLER_TOKEN)
            .with_account(profile(market.buyer.id, Role::Buyer, "Ada"), BUYER_TOKEN)
            .with_account(profile(rival.id, Role::Seller, "Rival"), RIVAL_TOKEN);

        let state = AppState::new(
            market.engine.clone(),
            market.store.clone(),
            Arc::new(accounts.provider()),
            BroadcastNotifier::default(),
        );

        Self {
            router: build_router(state),
            market,
        }
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(method, uri, token, body.map(|json| json.to_string()))
            .await
    }

    /// Sends `body` verbatim as `application/json`.
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(raw) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(raw)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn create_listing(&self, token: &str) -> (String, String) {
        let (status, body) = self
            .call(
                "POST",
                "/api/listings",
                Some(token),
                Some(json!({
                    "breed": "Labrador",
                    "age": "2 years",
                    "gender": "Male",
                    "dogType": "Home Dog",
                    "healthStatus": "Healthy",
                    "vaccinated": "Yes",
                    "size": "Large",
                    "color": "Yellow",
                    "behavior": "Friendly"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (
            body["id"].as_str().unwrap().to_string(),
            body["dogId"].as_str().unwrap().to_string(),
        )
    }

    async fn adopt(&self, listing_id: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/api/orders",
            Some(BUYER_TOKEN),
            Some(json!({ "listingId": listing_id })),
        )
        .await
    }
}

#[tokio::test]
async fn health_is_public_and_echoes_correlation_id() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
}

#[tokio::test]
async fn api_requires_a_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.call("GET", "/api/listings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.call("GET", "/api/listings", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn seller_creates_listing_and_buyer_sees_it() {
    let app = TestApp::new();
    let (id, dog_id) = app.create_listing(SELLER_TOKEN).await;

    let (status, body) = app.call("GET", "/api/listings", Some(BUYER_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    let listings = body.as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["dogId"], dog_id);
    assert_eq!(listings[0]["isSold"], false);
    assert_eq!(
        listings[0]["image"],
        "http://dogs.test/uploads/placeholder-image.jpg"
    );

    let (status, body) = app
        .call("GET", &format!("/api/listings/{id}"), Some(BUYER_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["breed"], "Labrador");
}

#[tokio::test]
async fn listing_validation_and_role_errors() {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            "POST",
            "/api/listings",
            Some(SELLER_TOKEN),
            Some(json!({ "breed": "Pug" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("healthStatus"));

    let (status, body) = app
        .call(
            "POST",
            "/api/listings",
            Some(BUYER_TOKEN),
            Some(json!({ "breed": "Pug" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn unknown_listing_is_404() {
    let app = TestApp::new();
    let (status, body) = app
        .call("GET", "/api/listings/not-a-uuid", Some(BUYER_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app.adopt(&uuid::Uuid::new_v4().to_string()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn adoption_conflicts_are_400_with_distinct_codes() {
    let app = TestApp::new();
    let (listing_id, _) = app.create_listing(SELLER_TOKEN).await;

    let (status, body) = app.adopt(&listing_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let order_id = body["orderId"].as_str().unwrap().to_string();

    let (status, body) = app.adopt(&listing_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_RESERVED");

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/orders/{order_id}"),
            Some(SELLER_TOKEN),
            Some(json!({ "status": "sold" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.adopt(&listing_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_SOLD");

    let (_, body) = app
        .call("GET", &format!("/api/listings/{listing_id}"), Some(BUYER_TOKEN), None)
        .await;
    assert_eq!(body["isSold"], true);
}

#[tokio::test]
async fn legacy_dog_id_field_is_accepted_for_orders() {
    let app = TestApp::new();
    let (listing_id, _) = app.create_listing(SELLER_TOKEN).await;

    let (status, _) = app
        .call(
            "POST",
            "/api/orders",
            Some(BUYER_TOKEN),
            Some(json!({ "dogId": listing_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn order_management_is_restricted_to_the_owning_seller() {
    let app = TestApp::new();
    let (listing_id, dog_id) = app.create_listing(SELLER_TOKEN).await;
    let (_, body) = app.adopt(&listing_id).await;
    let order_uri = format!("/api/orders/{}", body["orderId"].as_str().unwrap());

    let (status, _) = app.call("GET", "/api/orders", Some(BUYER_TOKEN), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call("GET", "/api/orders", Some(RIVAL_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, _) = app
        .call("PUT", &order_uri, Some(RIVAL_TOKEN), Some(json!({ "status": "confirmed" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call("GET", "/api/orders", Some(SELLER_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "pending");
    assert_eq!(orders[0]["listing"]["dogId"], dog_id);
    assert_eq!(
        orders[0]["listing"]["image"],
        "http://dogs.test/uploads/placeholder-image.jpg"
    );
    assert_eq!(orders[0]["buyer"]["name"], "Ada");
    assert_eq!(orders[0]["buyer"]["email"], "ada@example.com");
}

#[tokio::test]
async fn transitions_follow_the_status_graph() {
    let app = TestApp::new();
    let (listing_id, _) = app.create_listing(SELLER_TOKEN).await;
    let (_, body) = app.adopt(&listing_id).await;
    let order_uri = format!("/api/orders/{}", body["orderId"].as_str().unwrap());

    let (status, body) = app
        .call("PUT", &order_uri, Some(SELLER_TOKEN), Some(json!({ "status": "shipped" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .call("PUT", &order_uri, Some(SELLER_TOKEN), Some(json!({ "status": "confirmed" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call("PUT", &order_uri, Some(SELLER_TOKEN), Some(json!({ "status": "pending" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, body) = app.call("DELETE", &order_uri, Some(SELLER_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.call("DELETE", &order_uri, Some(SELLER_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.market.ledger.len(), 0);
}

#[tokio::test]
async fn sellers_cannot_request_adoption() {
    let app = TestApp::new();
    let (listing_id, _) = app.create_listing(SELLER_TOKEN).await;
    let (status, _) = app
        .call(
            "POST",
            "/api/orders",
            Some(SELLER_TOKEN),
            Some(json!({ "listingId": listing_id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unreadable_bodies_use_the_error_envelope() {
    let app = TestApp::new();
    let (listing_id, _) = app.create_listing(SELLER_TOKEN).await;

    let (status, body) = app
        .send("POST", "/api/orders", Some(BUYER_TOKEN), Some("{not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"].is_string());

    let (status, body) = app
        .call("POST", "/api/orders", Some(BUYER_TOKEN), Some(json!({ "listingId": 42 })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, body) = app.adopt(&listing_id).await;
    let order_uri = format!("/api/orders/{}", body["orderId"].as_str().unwrap());
    let (status, body) = app
        .call("PUT", &order_uri, Some(SELLER_TOKEN), Some(json!({ "state": "sold" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .call("POST", "/api/orders", Some(BUYER_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_status_from_non_owner_is_forbidden() {
    let app = TestApp::new();
    let (listing_id, _) = app.create_listing(SELLER_TOKEN).await;
    let (_, body) = app.adopt(&listing_id).await;
    let order_uri = format!("/api/orders/{}", body["orderId"].as_str().unwrap());

    let (status, body) = app
        .call("PUT", &order_uri, Some(RIVAL_TOKEN), Some(json!({ "status": "shipped" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .call("PUT", &order_uri, Some(SELLER_TOKEN), Some(json!({ "status": "shipped" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
