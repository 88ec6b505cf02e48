//! SurrealDB implementation of [`CertificateRepository`].
//!
//! Certificates are never deleted. After issuance only the artifact
//! location and the verification fields change.

use chrono::{DateTime, Utc};
use doccon_core::error::{DocconError, DocconResult};
use doccon_core::models::certificate::{Certificate, CertificateStats, CreateCertificate};
use doccon_core::models::specialty::Specialty;
use doccon_core::repository::{CertificateRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const UNIQUE_INDEXES: &[(&str, &str)] = &[
    ("idx_certificate_number", "certificate_number"),
    ("idx_certificate_enrollment", "enrollment_id"),
];

#[derive(Debug, SurrealValue)]
struct CertificateRow {
    enrollment_id: String,
    doctor_id: String,
    hospital_id: String,
    certificate_number: String,
    issue_date: DateTime<Utc>,
    service_period: String,
    total_hours: u32,
    department: String,
    file_path: String,
    file_size: u64,
    is_verified: bool,
    verification_date: Option<DateTime<Utc>>,
    verified_by: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CertificateRowWithId {
    record_id: String,
    enrollment_id: String,
    doctor_id: String,
    hospital_id: String,
    certificate_number: String,
    issue_date: DateTime<Utc>,
    service_period: String,
    total_hours: u32,
    department: String,
    file_path: String,
    file_size: u64,
    is_verified: bool,
    verification_date: Option<DateTime<Utc>>,
    verified_by: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct VerifiedHoursRow {
    is_verified: bool,
    total_hours: u32,
}

impl CertificateRow {
    fn into_certificate(self, id: Uuid) -> Result<Certificate, DbError> {
        let department: Specialty = self
            .department
            .parse()
            .map_err(|_| DbError::Corrupt(format!("unknown department: {}", self.department)))?;
        let verified_by = self.verified_by.as_deref().map(parse_uuid).transpose()?;
        Ok(Certificate {
            id,
            enrollment_id: parse_uuid(&self.enrollment_id)?,
            doctor_id: parse_uuid(&self.doctor_id)?,
            hospital_id: parse_uuid(&self.hospital_id)?,
            certificate_number: self.certificate_number,
            issue_date: self.issue_date,
            service_period: self.service_period,
            total_hours: self.total_hours,
            department,
            file_path: self.file_path,
            file_size: self.file_size,
            is_verified: self.is_verified,
            verification_date: self.verification_date,
            verified_by,
            created_at: self.created_at,
        })
    }
}

impl CertificateRowWithId {
    fn try_into_certificate(self) -> Result<Certificate, DbError> {
        let id = parse_uuid(&self.record_id)?;
        CertificateRow {
            enrollment_id: self.enrollment_id,
            doctor_id: self.doctor_id,
            hospital_id: self.hospital_id,
            certificate_number: self.certificate_number,
            issue_date: self.issue_date,
            service_period: self.service_period,
            total_hours: self.total_hours,
            department: self.department,
            file_path: self.file_path,
            file_size: self.file_size,
            is_verified: self.is_verified,
            verification_date: self.verification_date,
            verified_by: self.verified_by,
            created_at: self.created_at,
        }
        .into_certificate(id)
    }
}

/// SurrealDB implementation of the Certificate repository.
#[derive(Clone)]
pub struct SurrealCertificateRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCertificateRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CertificateRepository for SurrealCertificateRepository<C> {
    async fn create(&self, input: CreateCertificate) -> DocconResult<Certificate> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('certificate', $id) SET \
                 enrollment_id = $enrollment_id, doctor_id = $doctor_id, \
                 hospital_id = $hospital_id, \
                 certificate_number = $certificate_number, \
                 issue_date = $issue_date, service_period = $service_period, \
                 total_hours = $total_hours, department = $department, \
                 file_path = $file_path, file_size = $file_size, \
                 is_verified = false, verification_date = NONE, \
                 verified_by = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("enrollment_id", input.enrollment_id.to_string()))
            .bind(("doctor_id", input.doctor_id.to_string()))
            .bind(("hospital_id", input.hospital_id.to_string()))
            .bind(("certificate_number", input.certificate_number))
            .bind(("issue_date", input.issue_date))
            .bind(("service_period", input.service_period))
            .bind(("total_hours", input.total_hours))
            .bind(("department", input.department.as_str().to_string()))
            .bind(("file_path", input.file_path))
            .bind(("file_size", input.file_size))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "certificate", UNIQUE_INDEXES))?;

        let rows: Vec<CertificateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "certificate".into(),
            id: id_str,
        })?;

        Ok(row.into_certificate(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DocconResult<Certificate> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('certificate', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "certificate".into(),
            id: id_str,
        })?;

        Ok(row.into_certificate(id)?)
    }

    async fn get_by_enrollment(&self, enrollment_id: Uuid) -> DocconResult<Option<Certificate>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate \
                 WHERE enrollment_id = $enrollment_id LIMIT 1",
            )
            .bind(("enrollment_id", enrollment_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_certificate()?)),
            None => Ok(None),
        }
    }

    async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<Certificate>> {
        let doctor_id_str = doctor_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM certificate \
                 WHERE doctor_id = $doctor_id GROUP ALL",
            )
            .bind(("doctor_id", doctor_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM certificate \
                 WHERE doctor_id = $doctor_id \
                 ORDER BY issue_date DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("doctor_id", doctor_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_certificate())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn attach_artifact(
        &self,
        id: Uuid,
        file_path: String,
        file_size: u64,
    ) -> DocconResult<Certificate> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('certificate', $id) SET \
                 file_path = $file_path, file_size = $file_size \
                 WHERE certificate_number != NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("file_path", file_path))
            .bind(("file_size", file_size))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "certificate".into(),
            id: id_str,
        })?;

        Ok(row.into_certificate(id)?)
    }

    async fn verify(&self, id: Uuid, verified_by: Uuid) -> DocconResult<Certificate> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('certificate', $id) SET \
                 is_verified = true, verification_date = time::now(), \
                 verified_by = $verified_by \
                 WHERE is_verified = false",
            )
            .bind(("id", id.to_string()))
            .bind(("verified_by", verified_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CertificateRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_certificate(id)?),
            None => {
                // Missing surfaces as NotFound; otherwise another verifier won.
                self.get_by_id(id).await?;
                Err(DocconError::validation("Certificate is already verified"))
            }
        }
    }

    async fn stats_for_doctor(&self, doctor_id: Uuid) -> DocconResult<CertificateStats> {
        let mut result = self
            .db
            .query(
                "SELECT is_verified, total_hours FROM certificate \
                 WHERE doctor_id = $doctor_id",
            )
            .bind(("doctor_id", doctor_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<VerifiedHoursRow> = result.take(0).map_err(DbError::from)?;

        let mut stats = CertificateStats::default();
        for row in rows {
            stats.total += 1;
            if row.is_verified {
                stats.verified += 1;
            } else {
                stats.pending_verification += 1;
            }
            stats.total_hours_certified += u64::from(row.total_hours);
        }
        Ok(stats)
    }
}
