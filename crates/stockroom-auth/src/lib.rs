//! Bearer-token authentication for stockroom.
//!
//! This crate provides JWT verification with a shared HMAC secret:
//!
//! - HS256/HS384/HS512 signature and optional expiry validation
//! - Identity extraction from the decoded payload
//! - Token issuing for operators and tests
//!
//! # Example
//!
//! ```no_run
//! use stockroom_auth::{AuthConfig, HmacVerifier, TokenVerifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = HmacVerifier::new(AuthConfig::new("change-me"));
//!
//! let token = verifier.issue("user-42", serde_json::Map::new())?;
//! let identity = verifier.verify(&token).await?;
//!
//! println!("User: {}", identity.user);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod jwt;

use std::fmt;

pub use error::{AuthError, Result};
pub use jwt::{HmacVerifier, Identity, TokenVerifier};

#[cfg(any(test, feature = "test-utils"))]
pub use jwt::MockTokenVerifier;

/// Configuration for token signing and verification.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared HMAC signing secret.
    pub secret: String,
    /// Lifetime of issued tokens, in seconds.
    pub token_ttl_seconds: u64,
    /// Clock skew tolerated when checking `exp`, in seconds.
    pub leeway_seconds: u64,
}

impl AuthConfig {
    /// Configuration with the given secret and default lifetimes.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_seconds: 3600,
            leeway_seconds: 0,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}
