//! Certificate queries, on-demand generation, download and verification.

use doccon_auth::require_admin;
use doccon_certs::{ArtifactStore, CertificateContent, CertificateIssuer, render_certificate};
use doccon_core::error::{DocconError, DocconResult};
use doccon_core::models::certificate::{Certificate, CertificateDetail, CertificateStats};
use doccon_core::models::doctor::Doctor;
use doccon_core::models::enrollment::EnrollmentStatus;
use doccon_core::repository::{
    CertificateRepository, DoctorRepository, EnrollmentRepository, HospitalRepository,
    PaginatedResult, Pagination,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::views;

/// A rendered certificate ready to be sent to the client.
#[derive(Debug)]
pub struct CertificateFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct CertificateService<D, H, E, C, S>
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
    certificates: C,
    issuer: CertificateIssuer<C, S>,
}

impl<D, H, E, C, S> CertificateService<D, H, E, C, S>
where
    D: DoctorRepository,
    H: HospitalRepository,
    E: EnrollmentRepository,
    C: CertificateRepository + Clone,
    S: ArtifactStore,
{
    pub fn new(doctors: D, hospitals: H, enrollments: E, certificates: C, store: S) -> Self {
        Self {
            doctors,
            hospitals,
            enrollments,
            issuer: CertificateIssuer::new(certificates.clone(), store),
            certificates,
        }
    }

    pub async fn list_for_doctor(
        &self,
        doctor: &Doctor,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<Certificate>> {
        self.certificates.list_by_doctor(doctor.id, pagination).await
    }

    /// A certificate with its enrollment, doctor and hospital. Doctors see
    /// only their own; admins see any.
    pub async fn get_for_doctor(&self, doctor: &Doctor, id: Uuid) -> DocconResult<CertificateDetail> {
        let certificate = self.visible(doctor, id).await?;
        self.detail(certificate).await
    }

    /// The PDF for a certificate. The stored artifact is preferred; when it
    /// is missing or unreadable the certificate is rendered again from its
    /// record.
    pub async fn download(&self, doctor: &Doctor, id: Uuid) -> DocconResult<CertificateFile> {
        let detail = self.get_for_doctor(doctor, id).await?;
        let certificate = &detail.certificate;
        let file_name = certificate.file_name();

        if !certificate.is_degraded() {
            match self.issuer.store().load(&certificate.file_path).await {
                Ok(bytes) => return Ok(CertificateFile { file_name, bytes }),
                Err(e) => warn!(
                    certificate_id = %certificate.id,
                    path = %certificate.file_path,
                    error = %e,
                    "Stored certificate unreadable, rendering again"
                ),
            }
        }

        let content =
            CertificateContent::for_certificate(certificate, &detail.doctor, &detail.hospital);
        let bytes = render_certificate(&content).map_err(DocconError::from)?;
        Ok(CertificateFile { file_name, bytes })
    }

    /// Issue the certificate for one of the doctor's completed enrollments
    /// that does not have one yet.
    pub async fn generate(&self, doctor: &Doctor, enrollment_id: Uuid) -> DocconResult<Certificate> {
        let enrollment = self.enrollments.get_by_id(enrollment_id).await?;
        if enrollment.doctor_id != doctor.id || enrollment.status != EnrollmentStatus::Completed {
            return Err(DocconError::NotFound {
                entity: "completed enrollment".into(),
                id: enrollment_id.to_string(),
            });
        }

        let detail = views::detail(&self.doctors, &self.hospitals, enrollment).await?;
        let certificate = self.issuer.issue(&detail).await?;
        if let Err(e) = self.enrollments.mark_certificate_generated(enrollment_id).await {
            error!(enrollment_id = %enrollment_id, error = %e, "Could not flag enrollment as certified");
        }
        Ok(certificate)
    }

    /// Mark a certificate verified. Admin only, once.
    pub async fn verify(&self, actor: &Doctor, id: Uuid) -> DocconResult<Certificate> {
        require_admin(actor)?;

        let verified = self.certificates.verify(id, actor.id).await?;
        info!(certificate_id = %id, admin_id = %actor.id, "Certificate verified");
        Ok(verified)
    }

    pub async fn stats_for_doctor(&self, doctor: &Doctor) -> DocconResult<CertificateStats> {
        self.certificates.stats_for_doctor(doctor.id).await
    }

    async fn visible(&self, doctor: &Doctor, id: Uuid) -> DocconResult<Certificate> {
        let certificate = self.certificates.get_by_id(id).await?;
        if certificate.doctor_id != doctor.id && !doctor.is_admin() {
            return Err(DocconError::not_found("certificate", id));
        }
        Ok(certificate)
    }

    async fn detail(&self, certificate: Certificate) -> DocconResult<CertificateDetail> {
        let enrollment = self.enrollments.get_by_id(certificate.enrollment_id).await?;
        let doctor = self.doctors.get_by_id(certificate.doctor_id).await?;
        let hospital = self.hospitals.get_by_id(certificate.hospital_id).await?;
        Ok(CertificateDetail {
            status: certificate.status_label(),
            certificate,
            enrollment,
            doctor: doctor.summary(),
            hospital: hospital.summary(),
        })
    }
}
