//! Custom Axum extractors.
//!
//! - `BearerToken`: The raw credential from `Authorization: Bearer <token>`
//! - `Authenticated`: The verified principal behind the bearer token
//! - `JsonBody`: A JSON request body whose rejections render as [`AppError`]

use crate::error::AppError;
use axum::{
    Json, async_trait,
    extract::{FromRef, FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::{header, request::Parts},
};
use dogworld_core::identity::IdentityProvider;
use dogworld_core::types::Principal;
use std::sync::Arc;

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("No token provided"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .trim();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// A caller whose bearer token was verified by the identity provider.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    Arc<dyn IdentityProvider>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let identity = <Arc<dyn IdentityProvider> as FromRef<S>>::from_ref(state);

        let principal = identity.verify(&token).await.map_err(|err| {
            tracing::warn!(error = %err, "Credential rejected");
            AppError::from(err)
        })?;

        tracing::Span::current().record("user", tracing::field::display(principal.id));
        Ok(Self(principal))
    }
}

/// JSON request body.
///
/// Malformed JSON or a missing `Content-Type` is a 400 `BAD_REQUEST`; JSON
/// that does not fit the expected shape is a 422 `VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::JsonDataError(err)) => {
                tracing::debug!(error = %err.body_text(), "Request body has the wrong shape");
                Err(AppError::validation(err.body_text()))
            }
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Unreadable request body");
                Err(AppError::bad_request(rejection.body_text()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_bearer_token_extracted() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc123")
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let token = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(token.0, "abc123");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_bearer_token() {
        for header_value in [None, Some("Basic abc"), Some("Bearer   ")] {
            let mut builder = Request::builder();
            if let Some(value) = header_value {
                builder = builder.header(header::AUTHORIZATION, value);
            }
            let (mut parts, ()) = builder.body(()).unwrap().into_parts();

            let err = BearerToken::from_request_parts(&mut parts, &())
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_json_body_accepts_matching_payload() {
        let JsonBody(payload) =
            JsonBody::<Payload>::from_request(json_request(r#"{"name":"Rex"}"#), &())
                .await
                .unwrap();
        assert_eq!(payload.name, "Rex");
    }

    #[tokio::test]
    async fn test_json_body_rejections_are_app_errors() {
        let err = JsonBody::<Payload>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "BAD_REQUEST");

        let err = JsonBody::<Payload>::from_request(json_request(r#"{"name":7}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let untyped = Request::builder().body(Body::from(r#"{"name":"Rex"}"#)).unwrap();
        let err = JsonBody::<Payload>::from_request(untyped, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
