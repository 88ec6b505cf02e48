//! Doctor Connect Auth: password verification, JWT issuance/validation,
//! and the admin capability check.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthOutput, AuthService, require_admin};
pub use token::AccessTokenClaims;
