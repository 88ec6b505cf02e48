//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Services are generic over these
//! traits so they carry no dependency on the database crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DocconResult;
use crate::models::{
    certificate::{Certificate, CertificateStats, CreateCertificate},
    doctor::{CreateDoctor, Doctor, DoctorFilter, DoctorStats, UpdateDoctor},
    enrollment::{
        CreateEnrollment, Enrollment, EnrollmentFilter, EnrollmentStats, EnrollmentStatus,
        EnrollmentTransition,
    },
    hospital::{CreateHospital, Hospital, HospitalFilter, HospitalStats},
    specialty::Specialty,
};

const MAX_PAGE_SIZE: u64 = 100;
/// Largest row offset a listing will skip to. Pages beyond it are empty.
const MAX_OFFSET: u64 = u32::MAX as u64;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

impl Pagination {
    /// 1-based page number to offset. Page and limit are clamped to at
    /// least 1; limit is capped at 100 and the offset at `MAX_OFFSET`.
    pub fn page(page: u64, limit: u64) -> Self {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.clamp(1, MAX_OFFSET / limit + 1);
        Self {
            offset: (page - 1) * limit,
            limit,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> PaginatedResult<T> {
    pub fn current_page(&self) -> u64 {
        self.offset / self.limit.max(1) + 1
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.limit.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.current_page() > 1
    }

    /// Replace the items, keeping the page position.
    pub fn map_items<U>(self, items: Vec<U>) -> PaginatedResult<U> {
        PaginatedResult {
            items,
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }

    pub fn into_page(self) -> Page<T> {
        Page {
            current_page: self.current_page(),
            total_pages: self.total_pages(),
            has_next: self.has_next(),
            has_prev: self.has_prev(),
            total: self.total,
            items: self.items,
        }
    }
}

/// Wire shape of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

// ---------------------------------------------------------------------------
// Doctors
// ---------------------------------------------------------------------------

pub trait DoctorRepository: Send + Sync {
    /// Hashes `input.password` before persisting.
    fn create(&self, input: CreateDoctor) -> impl Future<Output = DocconResult<Doctor>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocconResult<Doctor>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = DocconResult<Doctor>> + Send;
    fn get_by_license_number(
        &self,
        license_number: &str,
    ) -> impl Future<Output = DocconResult<Doctor>> + Send;
    /// Missing ids are skipped.
    fn get_many(&self, ids: &[Uuid]) -> impl Future<Output = DocconResult<Vec<Doctor>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateDoctor,
    ) -> impl Future<Output = DocconResult<Doctor>> + Send;
    /// Hashes and stores a new password.
    fn set_password(
        &self,
        id: Uuid,
        password: &str,
    ) -> impl Future<Output = DocconResult<()>> + Send;
    /// Ordered by name.
    fn list(
        &self,
        filter: DoctorFilter,
        pagination: Pagination,
    ) -> impl Future<Output = DocconResult<PaginatedResult<Doctor>>> + Send;
    /// Case-insensitive match on name, specialization, city or state.
    /// Ordered by name.
    fn search(
        &self,
        query: &str,
        limit: u64,
    ) -> impl Future<Output = DocconResult<Vec<Doctor>>> + Send;
    /// Distinct specializations of registered doctors, sorted.
    fn specializations(&self) -> impl Future<Output = DocconResult<Vec<Specialty>>> + Send;
    fn stats(&self) -> impl Future<Output = DocconResult<DoctorStats>> + Send;
}

// ---------------------------------------------------------------------------
// Hospitals
// ---------------------------------------------------------------------------

pub trait HospitalRepository: Send + Sync {
    fn create(&self, input: CreateHospital)
    -> impl Future<Output = DocconResult<Hospital>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocconResult<Hospital>> + Send;
    /// Missing ids are skipped.
    fn get_many(&self, ids: &[Uuid])
    -> impl Future<Output = DocconResult<Vec<Hospital>>> + Send;
    /// Ordered by name.
    fn list(
        &self,
        filter: HospitalFilter,
        pagination: Pagination,
    ) -> impl Future<Output = DocconResult<PaginatedResult<Hospital>>> + Send;
    /// Case-insensitive match on name, city, state or address.
    fn search(
        &self,
        query: &str,
        limit: u64,
    ) -> impl Future<Output = DocconResult<Vec<Hospital>>> + Send;
    /// Distinct specialties offered across all hospitals, sorted.
    fn specializations(&self) -> impl Future<Output = DocconResult<Vec<Specialty>>> + Send;
    fn stats(&self) -> impl Future<Output = DocconResult<HospitalStats>> + Send;
    fn count(&self) -> impl Future<Output = DocconResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Enrollments
// ---------------------------------------------------------------------------

pub trait EnrollmentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateEnrollment,
    ) -> impl Future<Output = DocconResult<Enrollment>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocconResult<Enrollment>> + Send;
    /// A {pending, approved} enrollment of `doctor_id` at `hospital_id`
    /// whose period intersects `[start, end]`, if any.
    fn find_overlapping(
        &self,
        doctor_id: Uuid,
        hospital_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = DocconResult<Option<Enrollment>>> + Send;
    /// Conditional status change: applied only while the stored status is
    /// `from`. Fails with `NotFound` or `InvalidTransition` otherwise.
    fn transition(
        &self,
        id: Uuid,
        from: EnrollmentStatus,
        change: EnrollmentTransition,
    ) -> impl Future<Output = DocconResult<Enrollment>> + Send;
    /// Notes can only change while the enrollment is pending.
    fn update_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> impl Future<Output = DocconResult<Enrollment>> + Send;
    fn mark_certificate_generated(&self, id: Uuid)
    -> impl Future<Output = DocconResult<()>> + Send;
    /// Newest first.
    fn list(
        &self,
        filter: EnrollmentFilter,
        pagination: Pagination,
    ) -> impl Future<Output = DocconResult<PaginatedResult<Enrollment>>> + Send;
    /// Approved enrollments of `doctor_id` whose period contains `at`.
    fn list_active(
        &self,
        doctor_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = DocconResult<Vec<Enrollment>>> + Send;
    fn stats_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> impl Future<Output = DocconResult<EnrollmentStats>> + Send;
}

// ---------------------------------------------------------------------------
// Certificates
// ---------------------------------------------------------------------------

pub trait CertificateRepository: Send + Sync {
    /// Fails with `AlreadyExists` (field `certificate_number` or
    /// `enrollment_id`) on a unique index violation.
    fn create(
        &self,
        input: CreateCertificate,
    ) -> impl Future<Output = DocconResult<Certificate>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DocconResult<Certificate>> + Send;
    fn get_by_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> impl Future<Output = DocconResult<Option<Certificate>>> + Send;
    /// Newest issue date first.
    fn list_by_doctor(
        &self,
        doctor_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = DocconResult<PaginatedResult<Certificate>>> + Send;
    /// Record where the rendered PDF of an issued certificate is stored.
    fn attach_artifact(
        &self,
        id: Uuid,
        file_path: String,
        file_size: u64,
    ) -> impl Future<Output = DocconResult<Certificate>> + Send;
    /// Guarded on `is_verified = false`. A certificate that is already
    /// verified fails with `Validation`.
    fn verify(
        &self,
        id: Uuid,
        verified_by: Uuid,
    ) -> impl Future<Output = DocconResult<Certificate>> + Send;
    fn stats_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> impl Future<Output = DocconResult<CertificateStats>> + Send;
}
