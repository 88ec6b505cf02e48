//! Enrollment domain model.
//!
//! An enrollment is a doctor's request to serve a hospital department
//! for a bounded period. Its status follows a small state machine:
//!
//! ```text
//! pending ──► approved ──► completed
//!    │
//!    ├──► rejected
//!    └──► cancelled
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::doctor::DoctorSummary;
use super::hospital::HospitalSummary;
use super::specialty::Specialty;
use crate::error::DocconError;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Rejected => "rejected",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnrollmentStatus::Rejected | EnrollmentStatus::Completed | EnrollmentStatus::Cancelled
        )
    }

    /// Statuses that block an overlapping enrollment at the same hospital.
    pub fn holds_slot(&self) -> bool {
        matches!(self, EnrollmentStatus::Pending | EnrollmentStatus::Approved)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = DocconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EnrollmentStatus::Pending),
            "approved" => Ok(EnrollmentStatus::Approved),
            "rejected" => Ok(EnrollmentStatus::Rejected),
            "completed" => Ok(EnrollmentStatus::Completed),
            "cancelled" => Ok(EnrollmentStatus::Cancelled),
            other => Err(DocconError::validation(format!(
                "unknown enrollment status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Committed service hours per week (1..=40).
    pub weekly_hours: u32,
    pub department: Specialty,
    pub status: EnrollmentStatus,
    pub notes: Option<String>,
    /// Admin remarks; holds the rejection reason.
    pub admin_notes: Option<String>,
    pub total_hours_completed: u32,
    pub completion_date: Option<DateTime<Utc>>,
    pub certificate_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Whole days covered by the service period, rounded up.
    pub fn duration_days(&self) -> i64 {
        duration_days(self.start_date, self.end_date)
    }

    /// `M/D/YYYY - M/D/YYYY`.
    pub fn service_period(&self) -> String {
        format!(
            "{} - {}",
            self.start_date.format("%-m/%-d/%Y"),
            self.end_date.format("%-m/%-d/%Y")
        )
    }

    /// Approved and `now` falls inside the service period.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == EnrollmentStatus::Approved && self.start_date <= now && self.end_date >= now
    }
}

/// `ceil((end - start) / 1 day)`, zero for inverted ranges.
pub fn duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Enrollment request as submitted by a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEnrollmentRequest {
    pub hospital_id: Uuid,
    #[serde(deserialize_with = "date_or_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "date_or_datetime")]
    pub end_date: DateTime<Utc>,
    #[serde(alias = "service_hours")]
    #[validate(range(min = 1, max = 40, message = "Service hours must be between 1 and 40 per week"))]
    pub weekly_hours: u32,
    pub department: Specialty,
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
}

/// Fields required by the store to create an enrollment.
#[derive(Debug, Clone)]
pub struct CreateEnrollment {
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub weekly_hours: u32,
    pub department: Specialty,
    pub notes: Option<String>,
    pub status: EnrollmentStatus,
}

/// A guarded status change plus the fields that change with it.
#[derive(Debug, Clone)]
pub struct EnrollmentTransition {
    pub to: EnrollmentStatus,
    pub admin_notes: Option<String>,
    pub completion_date: Option<DateTime<Utc>>,
    pub total_hours_completed: Option<u32>,
}

impl EnrollmentTransition {
    pub fn to(status: EnrollmentStatus) -> Self {
        Self {
            to: status,
            admin_notes: None,
            completion_date: None,
            total_hours_completed: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub doctor_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
    pub status: Option<EnrollmentStatus>,
}

/// Enrollment with its hospital, as shown to the owning doctor.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentView {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub hospital: HospitalSummary,
}

/// Enrollment with doctor and hospital, as shown to admins and used
/// for certificate issuance.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentDetail {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub doctor: DoctorSummary,
    pub hospital: HospitalSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollmentStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub completed: u64,
    pub rejected: u64,
    pub cancelled: u64,
    pub total_hours_served: u64,
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn date_or_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_or_datetime(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_date_or_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn duration_rounds_partial_days_up() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(duration_days(start, end), 14);

        let end = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 1).unwrap();
        assert_eq!(duration_days(start, end), 15);
    }

    #[test]
    fn inverted_range_has_zero_duration() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(duration_days(start, end), 0);
    }

    #[test]
    fn request_accepts_bare_dates_and_legacy_hours_field() {
        let json = serde_json::json!({
            "hospital_id": Uuid::nil(),
            "start_date": "2024-03-01",
            "end_date": "2024-03-10T12:00:00Z",
            "service_hours": 12,
            "department": "Cardiology"
        });
        let req: CreateEnrollmentRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.start_date, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(req.end_date, Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap());
        assert_eq!(req.weekly_hours, 12);
        assert!(req.notes.is_none());
    }

    #[test]
    fn weekly_hours_out_of_range_fails_validation() {
        let req = CreateEnrollmentRequest {
            hospital_id: Uuid::nil(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            weekly_hours: 41,
            department: Specialty::Surgery,
            notes: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn status_parsing() {
        assert_eq!(
            "approved".parse::<EnrollmentStatus>().unwrap(),
            EnrollmentStatus::Approved
        );
        assert!("archived".parse::<EnrollmentStatus>().is_err());
        assert!(EnrollmentStatus::Cancelled.is_terminal());
        assert!(!EnrollmentStatus::Approved.is_terminal());
    }
}
