//! Domain models for Doctor Connect.
//!
//! Relations between entities are plain UUID references; composed
//! views (`*Summary`, `*View`, `*Detail`) are assembled by the
//! services, never by the store.

pub mod certificate;
pub mod doctor;
pub mod enrollment;
pub mod hospital;
pub mod specialty;
