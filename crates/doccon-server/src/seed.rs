//! Startup data: the hospital catalogue and the bootstrap administrator.

use std::path::Path;

use anyhow::{Context, Result};
use doccon_core::error::DocconError;
use doccon_core::models::doctor::{DoctorRole, UpdateDoctor};
use doccon_core::models::hospital::CreateHospital;
use doccon_core::repository::{DoctorRepository, HospitalRepository};
use tracing::{info, warn};

/// Load hospitals from a JSON array when the catalogue is empty.
///
/// Returns the number of hospitals created. Entries the store rejects are
/// skipped with a warning.
pub async fn seed_hospitals<H: HospitalRepository>(hospitals: &H, path: &Path) -> Result<usize> {
    let existing = hospitals.count().await?;
    if existing > 0 {
        info!(existing, "Hospital catalogue already populated, skipping seed");
        return Ok(0);
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read hospital seed file {}", path.display()))?;
    let entries: Vec<CreateHospital> = serde_json::from_str(&raw)
        .with_context(|| format!("hospital seed file {} is not a JSON array of hospitals", path.display()))?;

    let mut created = 0;
    for entry in entries {
        let name = entry.name.clone();
        match hospitals.create(entry).await {
            Ok(_) => created += 1,
            Err(e) => warn!(hospital = %name, error = %e, "Skipping seed hospital"),
        }
    }

    info!(created, path = %path.display(), "Hospital catalogue seeded");
    Ok(created)
}

/// Give the doctor registered under `email` the admin role.
///
/// Returns `false` when no such doctor exists yet.
pub async fn promote_admin<D: DoctorRepository>(doctors: &D, email: &str) -> Result<bool> {
    let doctor = match doctors.get_by_email(email).await {
        Ok(doctor) => doctor,
        Err(DocconError::NotFound { .. }) => {
            warn!(email, "Bootstrap admin is not registered yet");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    if doctor.is_admin() {
        return Ok(true);
    }

    doctors
        .update(
            doctor.id,
            UpdateDoctor {
                role: Some(DoctorRole::Admin),
                ..Default::default()
            },
        )
        .await?;
    info!(doctor_id = %doctor.id, "Bootstrap admin promoted");
    Ok(true)
}
