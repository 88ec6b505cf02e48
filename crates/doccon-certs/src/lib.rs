//! Doctor Connect Certs: service certificate issuance.
//!
//! Computes certified hours, allocates certificate numbers, renders the
//! one-page PDF with `lopdf` and stores it through an [`ArtifactStore`].

pub mod error;
pub mod hours;
pub mod issuer;
pub mod number;
pub mod render;
pub mod store;

pub use error::CertError;
pub use hours::total_hours;
pub use issuer::CertificateIssuer;
pub use number::generate_certificate_number;
pub use render::{CertificateContent, render_certificate};
pub use store::{ArtifactStore, FsArtifactStore, StoredArtifact};
