//! SurrealDB implementation of [`EnrollmentRepository`].
//!
//! Status changes are conditional updates (`WHERE status = $from`), so two
//! concurrent admins cannot both move the same enrollment out of a state.

use chrono::{DateTime, Utc};
use doccon_core::error::{DocconError, DocconResult};
use doccon_core::models::enrollment::{
    CreateEnrollment, Enrollment, EnrollmentFilter, EnrollmentStats, EnrollmentStatus,
    EnrollmentTransition,
};
use doccon_core::models::specialty::Specialty;
use doccon_core::repository::{EnrollmentRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct EnrollmentRow {
    doctor_id: String,
    hospital_id: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    weekly_hours: u32,
    department: String,
    status: String,
    notes: Option<String>,
    admin_notes: Option<String>,
    total_hours_completed: u32,
    completion_date: Option<DateTime<Utc>>,
    certificate_generated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct EnrollmentRowWithId {
    record_id: String,
    doctor_id: String,
    hospital_id: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    weekly_hours: u32,
    department: String,
    status: String,
    notes: Option<String>,
    admin_notes: Option<String>,
    total_hours_completed: u32,
    completion_date: Option<DateTime<Utc>>,
    certificate_generated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct StatusHoursRow {
    status: String,
    total_hours_completed: u32,
}

fn parse_status(s: &str) -> Result<EnrollmentStatus, DbError> {
    s.parse()
        .map_err(|_| DbError::Corrupt(format!("unknown enrollment status: {s}")))
}

/// Verb used in `InvalidTransition` errors.
fn action_for(to: EnrollmentStatus) -> &'static str {
    match to {
        EnrollmentStatus::Pending => "reopen",
        EnrollmentStatus::Approved => "approve",
        EnrollmentStatus::Rejected => "reject",
        EnrollmentStatus::Completed => "complete",
        EnrollmentStatus::Cancelled => "cancel",
    }
}

impl EnrollmentRow {
    fn into_enrollment(self, id: Uuid) -> Result<Enrollment, DbError> {
        let department: Specialty = self
            .department
            .parse()
            .map_err(|_| DbError::Corrupt(format!("unknown department: {}", self.department)))?;
        Ok(Enrollment {
            id,
            doctor_id: parse_uuid(&self.doctor_id)?,
            hospital_id: parse_uuid(&self.hospital_id)?,
            start_date: self.start_date,
            end_date: self.end_date,
            weekly_hours: self.weekly_hours,
            department,
            status: parse_status(&self.status)?,
            notes: self.notes,
            admin_notes: self.admin_notes,
            total_hours_completed: self.total_hours_completed,
            completion_date: self.completion_date,
            certificate_generated: self.certificate_generated,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl EnrollmentRowWithId {
    fn try_into_enrollment(self) -> Result<Enrollment, DbError> {
        let id = parse_uuid(&self.record_id)?;
        EnrollmentRow {
            doctor_id: self.doctor_id,
            hospital_id: self.hospital_id,
            start_date: self.start_date,
            end_date: self.end_date,
            weekly_hours: self.weekly_hours,
            department: self.department,
            status: self.status,
            notes: self.notes,
            admin_notes: self.admin_notes,
            total_hours_completed: self.total_hours_completed,
            completion_date: self.completion_date,
            certificate_generated: self.certificate_generated,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_enrollment(id)
    }
}

fn collect_enrollments(rows: Vec<EnrollmentRowWithId>) -> Result<Vec<Enrollment>, DbError> {
    rows.into_iter()
        .map(|row| row.try_into_enrollment())
        .collect()
}

/// SurrealDB implementation of the Enrollment repository.
#[derive(Clone)]
pub struct SurrealEnrollmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEnrollmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Explain why a guarded update touched nothing.
    async fn rejected_change(&self, id: Uuid, action: &str) -> DocconError {
        match self.get_by_id(id).await {
            Ok(current) => DocconError::InvalidTransition {
                status: current.status.to_string(),
                action: action.into(),
            },
            Err(e) => e,
        }
    }
}

impl<C: Connection> EnrollmentRepository for SurrealEnrollmentRepository<C> {
    async fn create(&self, input: CreateEnrollment) -> DocconResult<Enrollment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('enrollment', $id) SET \
                 doctor_id = $doctor_id, hospital_id = $hospital_id, \
                 start_date = $start_date, end_date = $end_date, \
                 weekly_hours = $weekly_hours, department = $department, \
                 status = $status, notes = $notes, admin_notes = NONE, \
                 total_hours_completed = 0, completion_date = NONE, \
                 certificate_generated = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("doctor_id", input.doctor_id.to_string()))
            .bind(("hospital_id", input.hospital_id.to_string()))
            .bind(("start_date", input.start_date))
            .bind(("end_date", input.end_date))
            .bind(("weekly_hours", input.weekly_hours))
            .bind(("department", input.department.as_str().to_string()))
            .bind(("status", input.status.as_str().to_string()))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<EnrollmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "enrollment".into(),
            id: id_str,
        })?;

        Ok(row.into_enrollment(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DocconResult<Enrollment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('enrollment', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EnrollmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "enrollment".into(),
            id: id_str,
        })?;

        Ok(row.into_enrollment(id)?)
    }

    async fn find_overlapping(
        &self,
        doctor_id: Uuid,
        hospital_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DocconResult<Option<Enrollment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM enrollment \
                 WHERE doctor_id = $doctor_id AND hospital_id = $hospital_id \
                 AND status IN ['pending', 'approved'] \
                 AND start_date <= $end AND end_date >= $start \
                 LIMIT 1",
            )
            .bind(("doctor_id", doctor_id.to_string()))
            .bind(("hospital_id", hospital_id.to_string()))
            .bind(("start", start))
            .bind(("end", end))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EnrollmentRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_enrollment()?)),
            None => Ok(None),
        }
    }

    async fn transition(
        &self,
        id: Uuid,
        from: EnrollmentStatus,
        change: EnrollmentTransition,
    ) -> DocconResult<Enrollment> {
        let id_str = id.to_string();

        let mut sets = vec!["status = $to"];
        if change.admin_notes.is_some() {
            sets.push("admin_notes = $admin_notes");
        }
        if change.completion_date.is_some() {
            sets.push("completion_date = $completion_date");
        }
        if change.total_hours_completed.is_some() {
            sets.push("total_hours_completed = $total_hours_completed");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('enrollment', $id) SET {} \
             WHERE status = $from",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str))
            .bind(("from", from.as_str().to_string()))
            .bind(("to", change.to.as_str().to_string()));

        if let Some(admin_notes) = change.admin_notes {
            builder = builder.bind(("admin_notes", admin_notes));
        }
        if let Some(completion_date) = change.completion_date {
            builder = builder.bind(("completion_date", completion_date));
        }
        if let Some(total_hours_completed) = change.total_hours_completed {
            builder = builder.bind(("total_hours_completed", total_hours_completed));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<EnrollmentRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_enrollment(id)?),
            None => Err(self.rejected_change(id, action_for(change.to)).await),
        }
    }

    async fn update_notes(&self, id: Uuid, notes: Option<String>) -> DocconResult<Enrollment> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('enrollment', $id) SET \
                 notes = $notes, updated_at = time::now() \
                 WHERE status = 'pending'",
            )
            .bind(("id", id.to_string()))
            .bind(("notes", notes))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EnrollmentRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_enrollment(id)?),
            None => Err(self.rejected_change(id, "edit").await),
        }
    }

    async fn mark_certificate_generated(&self, id: Uuid) -> DocconResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('enrollment', $id) SET \
                 certificate_generated = true, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EnrollmentRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "enrollment".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: EnrollmentFilter,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<Enrollment>> {
        let mut conditions = Vec::new();
        if filter.doctor_id.is_some() {
            conditions.push("doctor_id = $doctor_id");
        }
        if filter.hospital_id.is_some() {
            conditions.push("hospital_id = $hospital_id");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query =
            format!("SELECT count() AS total FROM enrollment {where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM enrollment {where_clause} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset"
        );

        let doctor_id = filter.doctor_id.map(|id| id.to_string());
        let hospital_id = filter.hospital_id.map(|id| id.to_string());
        let status = filter.status.map(|s| s.as_str().to_string());

        let mut count_result = self
            .db
            .query(count_query)
            .bind(("doctor_id", doctor_id.clone()))
            .bind(("hospital_id", hospital_id.clone()))
            .bind(("status", status.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(list_query)
            .bind(("doctor_id", doctor_id))
            .bind(("hospital_id", hospital_id))
            .bind(("status", status))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EnrollmentRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: collect_enrollments(rows)?,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_active(&self, doctor_id: Uuid, at: DateTime<Utc>) -> DocconResult<Vec<Enrollment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM enrollment \
                 WHERE doctor_id = $doctor_id AND status = 'approved' \
                 AND start_date <= $at AND end_date >= $at \
                 ORDER BY start_date ASC",
            )
            .bind(("doctor_id", doctor_id.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EnrollmentRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect_enrollments(rows)?)
    }

    async fn stats_for_doctor(&self, doctor_id: Uuid) -> DocconResult<EnrollmentStats> {
        let mut result = self
            .db
            .query(
                "SELECT status, total_hours_completed FROM enrollment \
                 WHERE doctor_id = $doctor_id",
            )
            .bind(("doctor_id", doctor_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusHoursRow> = result.take(0).map_err(DbError::from)?;

        let mut stats = EnrollmentStats::default();
        for row in rows {
            stats.total += 1;
            match parse_status(&row.status)? {
                EnrollmentStatus::Pending => stats.pending += 1,
                EnrollmentStatus::Approved => stats.approved += 1,
                EnrollmentStatus::Rejected => stats.rejected += 1,
                EnrollmentStatus::Cancelled => stats.cancelled += 1,
                EnrollmentStatus::Completed => {
                    stats.completed += 1;
                    stats.total_hours_served += u64::from(row.total_hours_completed);
                }
            }
        }
        Ok(stats)
    }
}
