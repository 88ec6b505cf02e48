//! Enrollment lifecycle manager.
//!
//! ```text
//! pending ──approve──► approved ──complete──► completed
//!    │ reject (admin)
//!    │ cancel (owner)
//! ```
//!
//! Every status change goes through
//! [`EnrollmentRepository::transition`], which only writes while the
//! stored status still matches. Approval issues the certificate; if that
//! fails the approval stands and the failure is reported alongside it.

use chrono::Utc;
use doccon_auth::require_admin;
use doccon_certs::{ArtifactStore, CertificateIssuer, total_hours};
use doccon_core::error::{DocconError, DocconResult};
use doccon_core::models::certificate::Certificate;
use doccon_core::models::doctor::Doctor;
use doccon_core::models::enrollment::{
    CreateEnrollment, CreateEnrollmentRequest, Enrollment, EnrollmentDetail, EnrollmentFilter,
    EnrollmentStats, EnrollmentStatus, EnrollmentTransition, EnrollmentView,
};
use doccon_core::repository::{
    CertificateRepository, DoctorRepository, EnrollmentRepository, HospitalRepository,
    PaginatedResult, Pagination,
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::views;

const MAX_NOTES: usize = 500;

/// Result of an approval.
#[derive(Debug, Serialize)]
pub struct ApprovalOutcome {
    pub enrollment: Enrollment,
    pub certificate: Option<Certificate>,
    /// Set when the enrollment was approved but issuance failed.
    pub certificate_error: Option<String>,
}

pub struct EnrollmentService<D, H, E, C, S>
where
    D: DoctorRepository,
    H: HospitalRepository,
    E: EnrollmentRepository,
    C: CertificateRepository,
    S: ArtifactStore,
{
    doctors: D,
    hospitals: H,
    enrollments: E,
    issuer: CertificateIssuer<C, S>,
}

impl<D, H, E, C, S> EnrollmentService<D, H, E, C, S>
where
    D: DoctorRepository,
    H: HospitalRepository,
    E: EnrollmentRepository,
    C: CertificateRepository,
    S: ArtifactStore,
{
    pub fn new(doctors: D, hospitals: H, enrollments: E, issuer: CertificateIssuer<C, S>) -> Self {
        Self {
            doctors,
            hospitals,
            enrollments,
            issuer,
        }
    }

    // -------------------------------------------------------------------
    // Doctor-facing operations
    // -------------------------------------------------------------------

    /// Submit a pending enrollment.
    pub async fn create(
        &self,
        doctor: &Doctor,
        request: CreateEnrollmentRequest,
    ) -> DocconResult<EnrollmentView> {
        request.validate()?;

        if request.end_date <= request.start_date {
            return Err(DocconError::validation("End date must be after start date"));
        }
        let today = Utc::now().date_naive().and_hms_opt(0, 0, 0).map(|d| d.and_utc());
        if today.is_some_and(|today| request.start_date < today) {
            return Err(DocconError::validation("Start date cannot be in the past"));
        }

        let hospital = self.hospitals.get_by_id(request.hospital_id).await?;
        if !hospital.offers(request.department) {
            return Err(DocconError::validation(format!(
                "{} does not offer the {} department",
                hospital.name, request.department
            )));
        }

        if self
            .enrollments
            .find_overlapping(
                doctor.id,
                hospital.id,
                request.start_date,
                request.end_date,
            )
            .await?
            .is_some()
        {
            return Err(DocconError::validation(
                "You already have an enrollment at this hospital during this period",
            ));
        }

        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let enrollment = self
            .enrollments
            .create(CreateEnrollment {
                doctor_id: doctor.id,
                hospital_id: hospital.id,
                start_date: request.start_date,
                end_date: request.end_date,
                weekly_hours: request.weekly_hours,
                department: request.department,
                notes,
                status: EnrollmentStatus::Pending,
            })
            .await?;

        info!(
            enrollment_id = %enrollment.id,
            doctor_id = %doctor.id,
            hospital_id = %hospital.id,
            "Enrollment submitted"
        );

        Ok(EnrollmentView {
            enrollment,
            hospital: hospital.summary(),
        })
    }

    /// The doctor's own enrollment; anyone else's reads as missing.
    pub async fn get_for_doctor(&self, doctor: &Doctor, id: Uuid) -> DocconResult<EnrollmentView> {
        let enrollment = self.owned(doctor, id).await?;
        let hospital = self.hospitals.get_by_id(enrollment.hospital_id).await?;
        Ok(EnrollmentView {
            enrollment,
            hospital: hospital.summary(),
        })
    }

    pub async fn list_for_doctor(
        &self,
        doctor: &Doctor,
        status: Option<EnrollmentStatus>,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<EnrollmentView>> {
        let mut page = self
            .enrollments
            .list(
                EnrollmentFilter {
                    doctor_id: Some(doctor.id),
                    status,
                    ..Default::default()
                },
                pagination,
            )
            .await?;
        let items = views::with_hospitals(&self.hospitals, std::mem::take(&mut page.items)).await?;
        Ok(page.map_items(items))
    }

    /// Edit the notes of a pending enrollment.
    pub async fn update_notes(
        &self,
        doctor: &Doctor,
        id: Uuid,
        notes: Option<String>,
    ) -> DocconResult<EnrollmentView> {
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES) {
            return Err(DocconError::validation("Notes cannot exceed 500 characters"));
        }

        self.owned(doctor, id).await?;
        let enrollment = self.enrollments.update_notes(id, notes).await?;
        let hospital = self.hospitals.get_by_id(enrollment.hospital_id).await?;
        Ok(EnrollmentView {
            enrollment,
            hospital: hospital.summary(),
        })
    }

    /// Withdraw a pending enrollment. Only its owner may do so.
    pub async fn cancel(&self, doctor: &Doctor, id: Uuid) -> DocconResult<Enrollment> {
        self.owned(doctor, id).await?;
        let enrollment = self
            .enrollments
            .transition(
                id,
                EnrollmentStatus::Pending,
                EnrollmentTransition::to(EnrollmentStatus::Cancelled),
            )
            .await?;
        info!(enrollment_id = %id, doctor_id = %doctor.id, "Enrollment cancelled");
        Ok(enrollment)
    }

    pub async fn stats_for_doctor(&self, doctor: &Doctor) -> DocconResult<EnrollmentStats> {
        self.enrollments.stats_for_doctor(doctor.id).await
    }

    /// Approved enrollments whose service period contains the current
    /// instant.
    pub async fn active_for_doctor(&self, doctor: &Doctor) -> DocconResult<Vec<EnrollmentView>> {
        let active = self.enrollments.list_active(doctor.id, Utc::now()).await?;
        views::with_hospitals(&self.hospitals, active).await
    }

    // -------------------------------------------------------------------
    // Admin operations
    // -------------------------------------------------------------------

    /// Approve a pending enrollment and issue its certificate.
    pub async fn approve(&self, actor: &Doctor, id: Uuid) -> DocconResult<ApprovalOutcome> {
        require_admin(actor)?;

        let mut enrollment = self
            .enrollments
            .transition(
                id,
                EnrollmentStatus::Pending,
                EnrollmentTransition::to(EnrollmentStatus::Approved),
            )
            .await?;
        info!(enrollment_id = %id, admin_id = %actor.id, "Enrollment approved");

        match self.issue(enrollment.clone()).await {
            Ok(certificate) => {
                enrollment.certificate_generated = self.flag_certificate(id).await;
                Ok(ApprovalOutcome {
                    enrollment,
                    certificate: Some(certificate),
                    certificate_error: None,
                })
            }
            Err(e) => {
                error!(enrollment_id = %id, error = %e, "Certificate issuance failed after approval");
                Ok(ApprovalOutcome {
                    enrollment,
                    certificate: None,
                    certificate_error: Some(e.to_string()),
                })
            }
        }
    }

    /// Reject a pending enrollment with a reason.
    pub async fn reject(&self, actor: &Doctor, id: Uuid, reason: &str) -> DocconResult<Enrollment> {
        require_admin(actor)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DocconError::validation("Rejection reason is required"));
        }
        if reason.chars().count() > MAX_NOTES {
            return Err(DocconError::validation(
                "Rejection reason cannot exceed 500 characters",
            ));
        }

        let mut change = EnrollmentTransition::to(EnrollmentStatus::Rejected);
        change.admin_notes = Some(reason.to_string());
        let enrollment = self
            .enrollments
            .transition(id, EnrollmentStatus::Pending, change)
            .await?;
        info!(enrollment_id = %id, admin_id = %actor.id, "Enrollment rejected");
        Ok(enrollment)
    }

    /// Complete an approved enrollment whose service period has ended.
    pub async fn complete(&self, actor: &Doctor, id: Uuid) -> DocconResult<Enrollment> {
        require_admin(actor)?;
        let now = Utc::now();

        let current = self.enrollments.get_by_id(id).await?;
        if current.status != EnrollmentStatus::Approved {
            return Err(DocconError::InvalidTransition {
                status: current.status.to_string(),
                action: "complete".into(),
            });
        }
        if now < current.end_date {
            return Err(DocconError::InvalidTransition {
                status: current.status.to_string(),
                action: "complete an unfinished".into(),
            });
        }

        let mut change = EnrollmentTransition::to(EnrollmentStatus::Completed);
        change.completion_date = Some(now);
        change.total_hours_completed = Some(total_hours(
            current.weekly_hours,
            current.start_date,
            current.end_date,
        ));
        let enrollment = self
            .enrollments
            .transition(id, EnrollmentStatus::Approved, change)
            .await?;
        info!(
            enrollment_id = %id,
            admin_id = %actor.id,
            hours = enrollment.total_hours_completed,
            "Enrollment completed"
        );
        Ok(enrollment)
    }

    pub async fn list_pending(
        &self,
        actor: &Doctor,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<EnrollmentDetail>> {
        self.list_all(actor, Some(EnrollmentStatus::Pending), pagination)
            .await
    }

    pub async fn list_all(
        &self,
        actor: &Doctor,
        status: Option<EnrollmentStatus>,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<EnrollmentDetail>> {
        require_admin(actor)?;

        let mut page = self
            .enrollments
            .list(
                EnrollmentFilter {
                    status,
                    ..Default::default()
                },
                pagination,
            )
            .await?;
        let items =
            views::with_parties(&self.doctors, &self.hospitals, std::mem::take(&mut page.items))
                .await?;
        Ok(page.map_items(items))
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    async fn owned(&self, doctor: &Doctor, id: Uuid) -> DocconResult<Enrollment> {
        let enrollment = self.enrollments.get_by_id(id).await?;
        if enrollment.doctor_id != doctor.id {
            return Err(DocconError::not_found("enrollment", id));
        }
        Ok(enrollment)
    }

    async fn issue(&self, enrollment: Enrollment) -> DocconResult<Certificate> {
        let detail = views::detail(&self.doctors, &self.hospitals, enrollment).await?;
        self.issuer.issue(&detail).await
    }

    /// Set `certificate_generated`. A failure is logged; the certificate
    /// record stays authoritative.
    async fn flag_certificate(&self, id: Uuid) -> bool {
        match self.enrollments.mark_certificate_generated(id).await {
            Ok(()) => true,
            Err(e) => {
                error!(enrollment_id = %id, error = %e, "Could not flag enrollment as certified");
                false
            }
        }
    }
}
