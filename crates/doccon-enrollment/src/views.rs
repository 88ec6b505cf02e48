//! Joins of enrollments with their doctor and hospital.

use std::collections::HashMap;

use doccon_core::error::DocconResult;
use doccon_core::models::enrollment::{Enrollment, EnrollmentDetail, EnrollmentView};
use doccon_core::repository::{DoctorRepository, HospitalRepository};
use tracing::warn;
use uuid::Uuid;

fn unique_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Attach hospital summaries. Enrollments whose hospital has vanished
/// are dropped.
pub(crate) async fn with_hospitals<H: HospitalRepository>(
    hospitals: &H,
    enrollments: Vec<Enrollment>,
) -> DocconResult<Vec<EnrollmentView>> {
    let ids = unique_ids(enrollments.iter().map(|e| e.hospital_id));
    let by_id: HashMap<Uuid, _> = hospitals
        .get_many(&ids)
        .await?
        .into_iter()
        .map(|h| (h.id, h.summary()))
        .collect();

    Ok(enrollments
        .into_iter()
        .filter_map(|enrollment| match by_id.get(&enrollment.hospital_id) {
            Some(hospital) => Some(EnrollmentView {
                hospital: hospital.clone(),
                enrollment,
            }),
            None => {
                warn!(enrollment_id = %enrollment.id, "Enrollment references a missing hospital");
                None
            }
        })
        .collect())
}

/// Attach doctor and hospital summaries. Enrollments with a dangling
/// reference are dropped.
pub(crate) async fn with_parties<D: DoctorRepository, H: HospitalRepository>(
    doctors: &D,
    hospitals: &H,
    enrollments: Vec<Enrollment>,
) -> DocconResult<Vec<EnrollmentDetail>> {
    let doctor_ids = unique_ids(enrollments.iter().map(|e| e.doctor_id));
    let hospital_ids = unique_ids(enrollments.iter().map(|e| e.hospital_id));

    let doctors: HashMap<Uuid, _> = doctors
        .get_many(&doctor_ids)
        .await?
        .into_iter()
        .map(|d| (d.id, d.summary()))
        .collect();
    let hospitals: HashMap<Uuid, _> = hospitals
        .get_many(&hospital_ids)
        .await?
        .into_iter()
        .map(|h| (h.id, h.summary()))
        .collect();

    Ok(enrollments
        .into_iter()
        .filter_map(|enrollment| {
            match (
                doctors.get(&enrollment.doctor_id),
                hospitals.get(&enrollment.hospital_id),
            ) {
                (Some(doctor), Some(hospital)) => Some(EnrollmentDetail {
                    doctor: doctor.clone(),
                    hospital: hospital.clone(),
                    enrollment,
                }),
                _ => {
                    warn!(enrollment_id = %enrollment.id, "Enrollment references a missing doctor or hospital");
                    None
                }
            }
        })
        .collect())
}

/// Single-enrollment variant of [`with_parties`]; a dangling reference is
/// an error here.
pub(crate) async fn detail<D: DoctorRepository, H: HospitalRepository>(
    doctors: &D,
    hospitals: &H,
    enrollment: Enrollment,
) -> DocconResult<EnrollmentDetail> {
    let doctor = doctors.get_by_id(enrollment.doctor_id).await?;
    let hospital = hospitals.get_by_id(enrollment.hospital_id).await?;
    Ok(EnrollmentDetail {
        doctor: doctor.summary(),
        hospital: hospital.summary(),
        enrollment,
    })
}
