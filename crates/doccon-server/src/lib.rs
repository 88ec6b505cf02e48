//! Doctor Connect Server: axum HTTP API over the enrollment, certificate
//! and authentication services.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod seed;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::app_router;
pub use state::AppState;
