//! Authentication error types.

use doccon_core::error::DocconError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("access token required")]
    MissingToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("admin privileges required")]
    AdminRequired,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for DocconError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => DocconError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::MissingToken => DocconError::MissingToken,
            AuthError::TokenExpired => DocconError::TokenExpired,
            AuthError::TokenInvalid(reason) => DocconError::InvalidToken { reason },
            AuthError::AdminRequired => DocconError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => DocconError::Crypto(msg),
        }
    }
}
