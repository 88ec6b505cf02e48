//! Certificate error types.

use doccon_core::error::DocconError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertError {
    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("artifact storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("could not allocate a unique certificate number after {0} attempts")]
    NumberExhausted(u32),
}

impl From<lopdf::Error> for CertError {
    fn from(err: lopdf::Error) -> Self {
        CertError::Render(err.to_string())
    }
}

impl From<CertError> for DocconError {
    fn from(err: CertError) -> Self {
        match err {
            CertError::Storage(e) => DocconError::Storage(e.to_string()),
            other => DocconError::Certificate(other.to_string()),
        }
    }
}
