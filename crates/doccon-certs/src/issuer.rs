//! Certificate issuance for a single enrollment.

use chrono::Utc;
use doccon_core::error::{DocconError, DocconResult};
use doccon_core::models::certificate::{Certificate, CreateCertificate};
use doccon_core::models::enrollment::EnrollmentDetail;
use doccon_core::repository::CertificateRepository;
use tracing::{info, warn};

use crate::error::CertError;
use crate::hours::total_hours;
use crate::number::generate_certificate_number;
use crate::render::{CertificateContent, render_certificate};
use crate::store::{ArtifactStore, StoredArtifact};

const MAX_NUMBER_ATTEMPTS: u32 = 5;

/// Issues certificates: numbering, rendering, artifact storage and the
/// certificate record.
pub struct CertificateIssuer<C: CertificateRepository, S: ArtifactStore> {
    certificates: C,
    store: S,
}

impl<C: CertificateRepository, S: ArtifactStore> CertificateIssuer<C, S> {
    pub fn new(certificates: C, store: S) -> Self {
        Self {
            certificates,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issue the certificate for `detail`.
    ///
    /// Fails with `AlreadyExists` when the enrollment already has one. A
    /// rendering or storage failure does not fail issuance: the record is
    /// kept without an artifact.
    pub async fn issue(&self, detail: &EnrollmentDetail) -> DocconResult<Certificate> {
        let enrollment = &detail.enrollment;

        if self
            .certificates
            .get_by_enrollment(enrollment.id)
            .await?
            .is_some()
        {
            return Err(DocconError::AlreadyExists {
                entity: "certificate".into(),
                field: "enrollment_id".into(),
            });
        }

        let certificate = self.create_record(detail).await?;
        Ok(self.attach_pdf(detail, certificate).await)
    }

    /// Persist the record under a fresh number. Nothing is written to the
    /// store until the number is committed.
    async fn create_record(&self, detail: &EnrollmentDetail) -> DocconResult<Certificate> {
        let enrollment = &detail.enrollment;
        let hours = total_hours(
            enrollment.weekly_hours,
            enrollment.start_date,
            enrollment.end_date,
        );
        let service_period = enrollment.service_period();

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let certificate_number = generate_certificate_number();

            let created = self
                .certificates
                .create(CreateCertificate {
                    enrollment_id: enrollment.id,
                    doctor_id: enrollment.doctor_id,
                    hospital_id: enrollment.hospital_id,
                    certificate_number: certificate_number.clone(),
                    issue_date: Utc::now(),
                    service_period: service_period.clone(),
                    total_hours: hours,
                    department: enrollment.department,
                    file_path: String::new(),
                    file_size: 0,
                })
                .await;

            match created {
                Ok(certificate) => {
                    info!(
                        certificate_id = %certificate.id,
                        enrollment_id = %enrollment.id,
                        certificate_number = %certificate.certificate_number,
                        total_hours = hours,
                        "Certificate issued"
                    );
                    return Ok(certificate);
                }
                Err(DocconError::AlreadyExists { ref field, .. })
                    if field == "certificate_number" =>
                {
                    warn!(attempt, certificate_number = %certificate_number, "Certificate number collision");
                }
                Err(e) => return Err(e),
            }
        }

        Err(CertError::NumberExhausted(MAX_NUMBER_ATTEMPTS).into())
    }

    /// Render and store the PDF, then record its location. Any failure
    /// leaves the certificate without an artifact.
    async fn attach_pdf(&self, detail: &EnrollmentDetail, certificate: Certificate) -> Certificate {
        let content = CertificateContent::for_certificate(&certificate, &detail.doctor, &detail.hospital);

        let artifact = match self.render_and_store(&content).await {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!(
                    certificate_id = %certificate.id,
                    certificate_number = %certificate.certificate_number,
                    error = %e,
                    "Certificate artifact unavailable, issuing without file"
                );
                return certificate;
            }
        };

        match self
            .certificates
            .attach_artifact(certificate.id, artifact.path.clone(), artifact.size)
            .await
        {
            Ok(attached) => attached,
            Err(e) => {
                warn!(
                    certificate_id = %certificate.id,
                    error = %e,
                    "Could not record certificate artifact, discarding file"
                );
                if let Err(e) = self.store.remove(&artifact.path).await {
                    warn!(path = %artifact.path, error = %e, "Orphaned certificate artifact");
                }
                certificate
            }
        }
    }

    async fn render_and_store(&self, content: &CertificateContent) -> Result<StoredArtifact, CertError> {
        let bytes = render_certificate(content)?;
        let file_name = format!("certificate-{}.pdf", content.certificate_number);
        self.store.save(&file_name, &bytes).await
    }
}
