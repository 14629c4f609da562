//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token has expired.
    #[error("token expired")]
    TokenExpired,

    /// The token signature does not match the signing secret.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token format is invalid.
    #[error("invalid token format: {0}")]
    InvalidToken(String),

    /// A token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Returns `true` if the error describes the presented token rather
    /// than a failure on our side.
    #[must_use]
    pub const fn is_credential_error(&self) -> bool {
        !matches!(self, Self::Signing(_))
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::InvalidToken(err.to_string()),
        }
    }
}
