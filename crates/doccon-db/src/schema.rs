//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings; enums are
//! stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Doctors
-- =======================================================================
DEFINE TABLE doctor SCHEMAFULL;
DEFINE FIELD name ON TABLE doctor TYPE string;
DEFINE FIELD email ON TABLE doctor TYPE string;
DEFINE FIELD password_hash ON TABLE doctor TYPE string;
DEFINE FIELD phone ON TABLE doctor TYPE string;
DEFINE FIELD specialization ON TABLE doctor TYPE string;
DEFINE FIELD license_number ON TABLE doctor TYPE string;
DEFINE FIELD experience_years ON TABLE doctor TYPE int;
DEFINE FIELD address ON TABLE doctor TYPE string;
DEFINE FIELD city ON TABLE doctor TYPE string;
DEFINE FIELD state ON TABLE doctor TYPE string;
DEFINE FIELD is_verified ON TABLE doctor TYPE bool DEFAULT false;
DEFINE FIELD role ON TABLE doctor TYPE string \
    ASSERT $value IN ['doctor', 'admin'];
DEFINE FIELD created_at ON TABLE doctor TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE doctor TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_doctor_email ON TABLE doctor \
    COLUMNS email UNIQUE;
DEFINE INDEX idx_doctor_license ON TABLE doctor \
    COLUMNS license_number UNIQUE;

-- =======================================================================
-- Hospitals (reference data)
-- =======================================================================
DEFINE TABLE hospital SCHEMAFULL;
DEFINE FIELD name ON TABLE hospital TYPE string;
DEFINE FIELD kind ON TABLE hospital TYPE string \
    ASSERT $value IN ['government', 'private'];
DEFINE FIELD address ON TABLE hospital TYPE option<string>;
DEFINE FIELD city ON TABLE hospital TYPE string;
DEFINE FIELD state ON TABLE hospital TYPE string;
DEFINE FIELD capacity ON TABLE hospital TYPE option<int>;
DEFINE FIELD specialties ON TABLE hospital TYPE array<string> \
    DEFAULT [];
DEFINE FIELD facilities ON TABLE hospital TYPE array<string> \
    DEFAULT [];
DEFINE FIELD created_at ON TABLE hospital TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE hospital TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_hospital_name ON TABLE hospital COLUMNS name;

-- =======================================================================
-- Enrollments
-- =======================================================================
DEFINE TABLE enrollment SCHEMAFULL;
DEFINE FIELD doctor_id ON TABLE enrollment TYPE string;
DEFINE FIELD hospital_id ON TABLE enrollment TYPE string;
DEFINE FIELD start_date ON TABLE enrollment TYPE datetime;
DEFINE FIELD end_date ON TABLE enrollment TYPE datetime;
DEFINE FIELD weekly_hours ON TABLE enrollment TYPE int \
    ASSERT $value >= 1 AND $value <= 40;
DEFINE FIELD department ON TABLE enrollment TYPE string;
DEFINE FIELD status ON TABLE enrollment TYPE string \
    ASSERT $value IN ['pending', 'approved', 'rejected', 'completed', \
    'cancelled'];
DEFINE FIELD notes ON TABLE enrollment TYPE option<string>;
DEFINE FIELD admin_notes ON TABLE enrollment TYPE option<string>;
DEFINE FIELD total_hours_completed ON TABLE enrollment TYPE int \
    DEFAULT 0;
DEFINE FIELD completion_date ON TABLE enrollment TYPE option<datetime>;
DEFINE FIELD certificate_generated ON TABLE enrollment TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE enrollment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE enrollment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_enrollment_doctor_status ON TABLE enrollment \
    COLUMNS doctor_id, status;
DEFINE INDEX idx_enrollment_hospital_status ON TABLE enrollment \
    COLUMNS hospital_id, status;
DEFINE INDEX idx_enrollment_status_start ON TABLE enrollment \
    COLUMNS status, start_date;

-- =======================================================================
-- Certificates (append-only apart from verification)
-- =======================================================================
DEFINE TABLE certificate SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update FULL
        FOR delete NONE;
DEFINE FIELD enrollment_id ON TABLE certificate TYPE string;
DEFINE FIELD doctor_id ON TABLE certificate TYPE string;
DEFINE FIELD hospital_id ON TABLE certificate TYPE string;
DEFINE FIELD certificate_number ON TABLE certificate TYPE string;
DEFINE FIELD issue_date ON TABLE certificate TYPE datetime;
DEFINE FIELD service_period ON TABLE certificate TYPE string;
DEFINE FIELD total_hours ON TABLE certificate TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD department ON TABLE certificate TYPE string;
DEFINE FIELD file_path ON TABLE certificate TYPE string;
DEFINE FIELD file_size ON TABLE certificate TYPE int DEFAULT 0;
DEFINE FIELD is_verified ON TABLE certificate TYPE bool DEFAULT false;
DEFINE FIELD verification_date ON TABLE certificate \
    TYPE option<datetime>;
DEFINE FIELD verified_by ON TABLE certificate TYPE option<string>;
DEFINE FIELD created_at ON TABLE certificate TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_certificate_number ON TABLE certificate \
    COLUMNS certificate_number UNIQUE;
DEFINE INDEX idx_certificate_enrollment ON TABLE certificate \
    COLUMNS enrollment_id UNIQUE;
DEFINE INDEX idx_certificate_doctor_issued ON TABLE certificate \
    COLUMNS doctor_id, issue_date;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
    {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
