//! Service certificate domain model.
//!
//! A certificate is the immutable proof that a doctor served an
//! enrollment. The rendered PDF is derived data: the record is the
//! source of truth and the file can always be regenerated from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::doctor::DoctorSummary;
use super::enrollment::Enrollment;
use super::hospital::HospitalSummary;
use super::specialty::Specialty;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    /// Globally unique, e.g. `CERT-LX2K9Q1A-3F9ZK0P1`.
    pub certificate_number: String,
    pub issue_date: DateTime<Utc>,
    /// Human-readable `M/D/YYYY - M/D/YYYY`.
    pub service_period: String,
    pub total_hours: u32,
    pub department: Specialty,
    /// Location of the rendered PDF; empty when storage failed.
    pub file_path: String,
    pub file_size: u64,
    pub is_verified: bool,
    pub verification_date: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Certificate {
    pub fn status_label(&self) -> &'static str {
        if self.is_verified {
            "Verified"
        } else {
            "Pending Verification"
        }
    }

    /// `true` when no artifact was stored at issuance.
    pub fn is_degraded(&self) -> bool {
        self.file_path.is_empty()
    }

    pub fn file_name(&self) -> String {
        format!("certificate-{}.pdf", self.certificate_number)
    }
}

#[derive(Debug, Clone)]
pub struct CreateCertificate {
    pub enrollment_id: Uuid,
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub certificate_number: String,
    pub issue_date: DateTime<Utc>,
    pub service_period: String,
    pub total_hours: u32,
    pub department: Specialty,
    pub file_path: String,
    pub file_size: u64,
}

/// Certificate joined with everything needed to display or re-render it.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateDetail {
    #[serde(flatten)]
    pub certificate: Certificate,
    pub status: &'static str,
    pub enrollment: Enrollment,
    pub doctor: DoctorSummary,
    pub hospital: HospitalSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateStats {
    pub total: u64,
    pub verified: u64,
    pub pending_verification: u64,
    pub total_hours_certified: u64,
}
