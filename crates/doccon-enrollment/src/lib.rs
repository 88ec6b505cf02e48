//! Doctor Connect Enrollment: the enrollment lifecycle manager and the
//! certificate service built on top of it.
//!
//! Both services are generic over the `doccon-core` repository traits and
//! delegate every role check to [`doccon_auth::require_admin`].

pub mod certificates;
pub mod lifecycle;
mod views;

pub use certificates::{CertificateFile, CertificateService};
pub use lifecycle::{ApprovalOutcome, EnrollmentService};
