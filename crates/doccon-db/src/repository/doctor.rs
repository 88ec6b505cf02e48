//! SurrealDB implementation of [`DoctorRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.

use std::collections::BTreeSet;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use doccon_core::error::DocconResult;
use doccon_core::models::doctor::{
    CreateDoctor, Doctor, DoctorFilter, DoctorRole, DoctorStats, ExperienceStats, UpdateDoctor,
};
use doccon_core::models::specialty::Specialty;
use doccon_core::repository::{DoctorRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

const UNIQUE_INDEXES: &[(&str, &str)] = &[
    ("idx_doctor_email", "email"),
    ("idx_doctor_license", "license_number"),
];

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct DoctorRow {
    name: String,
    email: String,
    password_hash: String,
    phone: String,
    specialization: String,
    license_number: String,
    experience_years: u32,
    address: String,
    city: String,
    state: String,
    is_verified: bool,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct DoctorRowWithId {
    record_id: String,
    name: String,
    email: String,
    password_hash: String,
    phone: String,
    specialization: String,
    license_number: String,
    experience_years: u32,
    address: String,
    city: String,
    state: String,
    is_verified: bool,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// The columns the directory aggregates over.
#[derive(Debug, SurrealValue)]
struct DoctorFacetRow {
    specialization: String,
    experience_years: u32,
    city: String,
    state: String,
    is_verified: bool,
}

fn parse_role(s: &str) -> Result<DoctorRole, DbError> {
    match s {
        "doctor" => Ok(DoctorRole::Doctor),
        "admin" => Ok(DoctorRole::Admin),
        other => Err(DbError::Corrupt(format!("unknown doctor role: {other}"))),
    }
}

fn parse_specialty(s: &str) -> Result<Specialty, DbError> {
    s.parse()
        .map_err(|_| DbError::Corrupt(format!("unknown specialty: {s}")))
}

impl DoctorRow {
    fn into_doctor(self, id: Uuid) -> Result<Doctor, DbError> {
        Ok(Doctor {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            phone: self.phone,
            specialization: parse_specialty(&self.specialization)?,
            license_number: self.license_number,
            experience_years: self.experience_years,
            address: self.address,
            city: self.city,
            state: self.state,
            is_verified: self.is_verified,
            role: parse_role(&self.role)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DoctorRowWithId {
    fn try_into_doctor(self) -> Result<Doctor, DbError> {
        let id = parse_uuid(&self.record_id)?;
        DoctorRow {
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            phone: self.phone,
            specialization: self.specialization,
            license_number: self.license_number,
            experience_years: self.experience_years,
            address: self.address,
            city: self.city,
            state: self.state,
            is_verified: self.is_verified,
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_doctor(id)
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the Doctor repository.
#[derive(Clone)]
pub struct SurrealDoctorRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealDoctorRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn facets(&self) -> DocconResult<Vec<DoctorFacetRow>> {
        let mut result = self
            .db
            .query("SELECT specialization, experience_years, city, state, is_verified FROM doctor")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<DoctorFacetRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows)
    }

    async fn find_one(&self, field: &'static str, value: &str) -> DocconResult<Doctor> {
        let query = format!("SELECT meta::id(id) AS record_id, * FROM doctor WHERE {field} = $value");
        let mut result = self
            .db
            .query(query)
            .bind(("value", value.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DoctorRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "doctor".into(),
            id: format!("{field}={value}"),
        })?;

        Ok(row.try_into_doctor()?)
    }
}

impl<C: Connection> DoctorRepository for SurrealDoctorRepository<C> {
    async fn create(&self, input: CreateDoctor) -> DocconResult<Doctor> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('doctor', $id) SET \
                 name = $name, email = $email, \
                 password_hash = $password_hash, \
                 phone = $phone, specialization = $specialization, \
                 license_number = $license_number, \
                 experience_years = $experience_years, \
                 address = $address, city = $city, state = $state, \
                 is_verified = false, role = 'doctor'",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("password_hash", password_hash))
            .bind(("phone", input.phone))
            .bind(("specialization", input.specialization.as_str().to_string()))
            .bind(("license_number", input.license_number))
            .bind(("experience_years", input.experience_years))
            .bind(("address", input.address))
            .bind(("city", input.city))
            .bind(("state", input.state))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "doctor", UNIQUE_INDEXES))?;

        let rows: Vec<DoctorRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "doctor".into(),
            id: id_str,
        })?;

        Ok(row.into_doctor(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DocconResult<Doctor> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('doctor', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DoctorRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "doctor".into(),
            id: id_str,
        })?;

        Ok(row.into_doctor(id)?)
    }

    async fn get_by_email(&self, email: &str) -> DocconResult<Doctor> {
        self.find_one("email", &email.trim().to_lowercase()).await
    }

    async fn get_by_license_number(&self, license_number: &str) -> DocconResult<Doctor> {
        self.find_one("license_number", license_number).await
    }

    async fn get_many(&self, ids: &[Uuid]) -> DocconResult<Vec<Doctor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM doctor \
                 WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DoctorRowWithId> = result.take(0).map_err(DbError::from)?;
        let doctors = rows
            .into_iter()
            .map(|row| row.try_into_doctor())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(doctors)
    }

    async fn update(&self, id: Uuid, input: UpdateDoctor) -> DocconResult<Doctor> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.city.is_some() {
            sets.push("city = $city");
        }
        if input.state.is_some() {
            sets.push("state = $state");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.is_verified.is_some() {
            sets.push("is_verified = $is_verified");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('doctor', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(city) = input.city {
            builder = builder.bind(("city", city));
        }
        if let Some(state) = input.state {
            builder = builder.bind(("state", state));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(is_verified) = input.is_verified {
            builder = builder.bind(("is_verified", is_verified));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "doctor", UNIQUE_INDEXES))?;

        let rows: Vec<DoctorRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "doctor".into(),
            id: id_str,
        })?;

        Ok(row.into_doctor(id)?)
    }

    async fn set_password(&self, id: Uuid, password: &str) -> DocconResult<()> {
        let id_str = id.to_string();
        let password_hash = hash_password(password, self.pepper.as_deref())?;

        let mut result = self
            .db
            .query(
                "UPDATE type::record('doctor', $id) SET \
                 password_hash = $password_hash, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DoctorRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "doctor".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn list(
        &self,
        filter: DoctorFilter,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<Doctor>> {
        let mut conditions = Vec::new();
        if filter.specialization.is_some() {
            conditions.push("specialization = $specialization");
        }
        if filter.city.is_some() {
            conditions.push("string::contains(string::lowercase(city), $city)");
        }
        if filter.state.is_some() {
            conditions.push("string::contains(string::lowercase(state), $state)");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT count() AS total FROM doctor {where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM doctor {where_clause} \
             ORDER BY name ASC \
             LIMIT $limit START $offset"
        );

        let specialization = filter.specialization.map(|s| s.as_str().to_string());
        let city = filter.city.map(|c| c.trim().to_lowercase());
        let state = filter.state.map(|s| s.trim().to_lowercase());

        let mut count_result = self
            .db
            .query(count_query)
            .bind(("specialization", specialization.clone()))
            .bind(("city", city.clone()))
            .bind(("state", state.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(list_query)
            .bind(("specialization", specialization))
            .bind(("city", city))
            .bind(("state", state))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DoctorRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_doctor())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn search(&self, query: &str, limit: u64) -> DocconResult<Vec<Doctor>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM doctor WHERE \
                 string::contains(string::lowercase(name), $q) \
                 OR string::contains(string::lowercase(specialization), $q) \
                 OR string::contains(string::lowercase(city), $q) \
                 OR string::contains(string::lowercase(state), $q) \
                 ORDER BY name ASC LIMIT $limit",
            )
            .bind(("q", needle))
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DoctorRowWithId> = result.take(0).map_err(DbError::from)?;
        let doctors = rows
            .into_iter()
            .map(|row| row.try_into_doctor())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(doctors)
    }

    async fn specializations(&self) -> DocconResult<Vec<Specialty>> {
        let mut found = BTreeSet::new();
        for row in self.facets().await? {
            found.insert(parse_specialty(&row.specialization)?);
        }
        Ok(found.into_iter().collect())
    }

    async fn stats(&self) -> DocconResult<DoctorStats> {
        let rows = self.facets().await?;

        let mut stats = DoctorStats {
            total: rows.len() as u64,
            ..Default::default()
        };
        let mut cities = BTreeSet::new();
        let mut states = BTreeSet::new();
        let mut specializations = BTreeSet::new();
        let mut years_total = 0u64;
        let mut min_years = u32::MAX;
        let mut max_years = 0;

        for row in rows {
            if row.is_verified {
                stats.verified += 1;
            } else {
                stats.unverified += 1;
            }
            cities.insert(row.city.to_lowercase());
            states.insert(row.state.to_lowercase());
            specializations.insert(row.specialization);
            years_total += u64::from(row.experience_years);
            min_years = min_years.min(row.experience_years);
            max_years = max_years.max(row.experience_years);
        }

        stats.cities = cities.len() as u64;
        stats.states = states.len() as u64;
        stats.specializations = specializations.len() as u64;
        if stats.total > 0 {
            stats.experience = ExperienceStats {
                avg_experience: years_total as f64 / stats.total as f64,
                min_experience: min_years,
                max_experience: max_years,
            };
        }
        Ok(stats)
    }
}
