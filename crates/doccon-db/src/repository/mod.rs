//! SurrealDB repository implementations.

mod certificate;
mod doctor;
mod enrollment;
mod hospital;

pub use certificate::SurrealCertificateRepository;
pub use doctor::{SurrealDoctorRepository, hash_password};
pub use enrollment::SurrealEnrollmentRepository;
pub use hospital::SurrealHospitalRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Corrupt(format!("invalid UUID: {e}")))
}
