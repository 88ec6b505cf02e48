//! Error types for Doctor Connect.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocconError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity} with this {field}")]
    AlreadyExists { entity: String, field: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Cannot {action} enrollment in status '{status}'")]
    InvalidTransition { status: String, action: String },

    #[error("Access token required")]
    MissingToken,

    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("Token has expired")]
    TokenExpired,

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocconError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for DocconError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DocconError::Validation {
            message: errors.to_string(),
        }
    }
}

pub type DocconResult<T> = Result<T, DocconError>;
