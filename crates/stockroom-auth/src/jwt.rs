//! JWT verification and identity extraction.
//!
//! Tokens are HMAC-signed (HS256, HS384 or HS512) with a shared secret. A
//! token is accepted when its signature matches and, if it carries an `exp`,
//! that instant has not passed. No claim is required; the whole decoded
//! payload travels with the caller's identity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AuthError, Result};
use crate::AuthConfig;

/// The caller identity carried by a verified token.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// The `sub` claim, or the compact JSON payload when there is none.
    pub user: String,
    /// When the token was issued, if it says.
    pub issued_at: Option<DateTime<Utc>>,
    /// When the token expires, if it says.
    pub expires_at: Option<DateTime<Utc>>,
    /// The full decoded payload.
    pub claims: Map<String, Value>,
}

/// Trait for verifying bearer tokens.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a token and extract the caller identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, badly signed, or expired.
    async fn verify(&self, token: &str) -> Result<Identity>;
}

/// Claims written into issued tokens.
#[derive(Debug, Serialize)]
struct TokenClaims {
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    exp: i64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Signature algorithms accepted on verification.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// HMAC token verifier and HS256 issuer.
pub struct HmacVerifier {
    config: AuthConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl HmacVerifier {
    /// Create a verifier for the configured secret.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding,
            decoding,
        }
    }

    /// Sign a token for `subject`, valid for the configured TTL.
    ///
    /// `extra` claims are embedded alongside `sub`, `iat` and `exp`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails.
    pub fn issue(&self, subject: &str, extra: Map<String, Value>) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.config.token_ttl_seconds).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: Some(now),
            exp: now.saturating_add(ttl),
            extra,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = self.config.leeway_seconds;
        validation.validate_exp = true;
        validation.required_spec_claims.clear();
        validation
    }
}

#[async_trait]
impl TokenVerifier for HmacVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken("empty token".to_string()));
        }

        let payload = decode::<Map<String, Value>>(token, &self.decoding, &self.validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::from(e)
            })?
            .claims;

        let user = match payload.get("sub") {
            Some(Value::String(sub)) => sub.clone(),
            _ => Value::Object(payload.clone()).to_string(),
        };

        Ok(Identity {
            user,
            issued_at: timestamp_claim(&payload, "iat"),
            expires_at: timestamp_claim(&payload, "exp"),
            claims: payload,
        })
    }
}

fn timestamp_claim(payload: &Map<String, Value>, name: &str) -> Option<DateTime<Utc>> {
    payload
        .get(name)
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// A mock token verifier for testing.
///
/// This verifier accepts any token in the format `test-token:<user>`.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockTokenVerifier;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity> {
        let user = token
            .strip_prefix("test-token:")
            .filter(|user| !user.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("expected test-token:<user>".to_string()))?;

        Ok(Identity {
            user: user.to_string(),
            issued_at: Some(Utc::now()),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            claims: Map::new(),
        })
    }
}
