//! Authentication gate and extractor.
//!
//! [`AuthGate`] is a pipeline stage that verifies the bearer token of a
//! protected request and attaches the caller as an [`AuthUser`] extension.
//! Handlers read it back with the `AuthUser` extractor.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use stockroom_auth::{Identity, TokenVerifier};

use crate::error::ApiError;
use crate::pipeline::{Flow, Stage};

/// An authenticated caller, attached to the request by [`AuthGate`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    /// The token's `sub` claim, or its whole payload as compact JSON.
    pub user: String,
    /// When the presented token expires, if it says.
    pub expires_at: Option<DateTime<Utc>>,
    /// The full decoded token payload.
    pub claims: Map<String, Value>,
}

impl From<Identity> for AuthUser {
    fn from(identity: Identity) -> Self {
        Self {
            user: identity.user,
            expires_at: identity.expires_at,
            claims: identity.claims,
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Take the token from an `Authorization` header value.
///
/// The token is the second space-separated segment; a header without one
/// yields an empty token, which never verifies.
fn bearer_token(header: &str) -> &str {
    header.split(' ').nth(1).unwrap_or_default()
}

/// Pipeline stage rejecting requests without a valid bearer token.
pub struct AuthGate<V: TokenVerifier> {
    verifier: Arc<V>,
}

impl<V: TokenVerifier> AuthGate<V> {
    /// Create a gate backed by `verifier`.
    #[must_use]
    pub const fn new(verifier: Arc<V>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl<V: TokenVerifier + 'static> Stage for AuthGate<V> {
    async fn handle(&self, mut request: Request) -> Flow {
        let Some(header) = request.headers().get(AUTHORIZATION) else {
            tracing::debug!(path = %request.uri().path(), "No bearer token");
            return Flow::Respond(ApiError::Unauthorized.into_response());
        };
        let token = bearer_token(header.to_str().unwrap_or_default()).to_string();

        match self.verifier.verify(&token).await {
            Ok(identity) => {
                tracing::debug!(user = %identity.user, "Bearer token accepted");
                request.extensions_mut().insert(AuthUser::from(identity));
                Flow::Continue(request)
            }
            Err(err) => Flow::Respond(ApiError::from(err).into_response()),
        }
    }
}
