//! SurrealDB implementation of [`HospitalRepository`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use doccon_core::error::DocconResult;
use doccon_core::models::hospital::{
    CreateHospital, Hospital, HospitalFilter, HospitalKind, HospitalStats,
};
use doccon_core::models::specialty::Specialty;
use doccon_core::repository::{HospitalRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct HospitalRow {
    name: String,
    kind: String,
    address: Option<String>,
    city: String,
    state: String,
    capacity: Option<u32>,
    specialties: Vec<String>,
    facilities: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct HospitalRowWithId {
    record_id: String,
    name: String,
    kind: String,
    address: Option<String>,
    city: String,
    state: String,
    capacity: Option<u32>,
    specialties: Vec<String>,
    facilities: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Projection used for aggregate statistics.
#[derive(Debug, SurrealValue)]
struct HospitalFacetRow {
    kind: String,
    city: String,
    state: String,
    specialties: Vec<String>,
}

fn parse_kind(s: &str) -> Result<HospitalKind, DbError> {
    match s {
        "government" => Ok(HospitalKind::Government),
        "private" => Ok(HospitalKind::Private),
        other => Err(DbError::Corrupt(format!("unknown hospital type: {other}"))),
    }
}

fn parse_specialties(raw: &[String]) -> Result<Vec<Specialty>, DbError> {
    raw.iter()
        .map(|s| {
            s.parse()
                .map_err(|_| DbError::Corrupt(format!("unknown specialty: {s}")))
        })
        .collect()
}

impl HospitalRow {
    fn into_hospital(self, id: Uuid) -> Result<Hospital, DbError> {
        Ok(Hospital {
            id,
            name: self.name,
            kind: parse_kind(&self.kind)?,
            address: self.address,
            city: self.city,
            state: self.state,
            capacity: self.capacity,
            specialties: parse_specialties(&self.specialties)?,
            facilities: self.facilities,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl HospitalRowWithId {
    fn try_into_hospital(self) -> Result<Hospital, DbError> {
        let id = parse_uuid(&self.record_id)?;
        HospitalRow {
            name: self.name,
            kind: self.kind,
            address: self.address,
            city: self.city,
            state: self.state,
            capacity: self.capacity,
            specialties: self.specialties,
            facilities: self.facilities,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_hospital(id)
    }
}

fn collect_hospitals(rows: Vec<HospitalRowWithId>) -> Result<Vec<Hospital>, DbError> {
    rows.into_iter()
        .map(|row| row.try_into_hospital())
        .collect()
}

/// SurrealDB implementation of the Hospital repository.
#[derive(Clone)]
pub struct SurrealHospitalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealHospitalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn facets(&self) -> DocconResult<Vec<HospitalFacetRow>> {
        let mut result = self
            .db
            .query("SELECT kind, city, state, specialties FROM hospital")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<HospitalFacetRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows)
    }
}

impl<C: Connection> HospitalRepository for SurrealHospitalRepository<C> {
    async fn create(&self, input: CreateHospital) -> DocconResult<Hospital> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let specialties: Vec<String> = input
            .specialties
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let result = self
            .db
            .query(
                "CREATE type::record('hospital', $id) SET \
                 name = $name, kind = $kind, address = $address, \
                 city = $city, state = $state, capacity = $capacity, \
                 specialties = $specialties, facilities = $facilities",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("kind", input.kind.as_str().to_string()))
            .bind(("address", input.address))
            .bind(("city", input.city))
            .bind(("state", input.state))
            .bind(("capacity", input.capacity))
            .bind(("specialties", specialties))
            .bind(("facilities", input.facilities))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<HospitalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "hospital".into(),
            id: id_str,
        })?;

        Ok(row.into_hospital(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DocconResult<Hospital> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('hospital', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HospitalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "hospital".into(),
            id: id_str,
        })?;

        Ok(row.into_hospital(id)?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> DocconResult<Vec<Hospital>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM hospital \
                 WHERE meta::id(id) IN $ids",
            )
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HospitalRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect_hospitals(rows)?)
    }

    async fn list(
        &self,
        filter: HospitalFilter,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<Hospital>> {
        let mut conditions = Vec::new();
        if filter.kind.is_some() {
            conditions.push("kind = $kind");
        }
        if filter.specialization.is_some() {
            conditions.push("$specialization IN specialties");
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

        let count_query = format!("SELECT count() AS total FROM hospital {where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM hospital {where_clause} \
             ORDER BY name ASC \
             LIMIT $limit START $offset"
        );

        let kind = filter.kind.map(|k| k.as_str().to_string());
        let specialization = filter.specialization.map(|s| s.as_str().to_string());
        let city = filter.city.map(|c| c.trim().to_lowercase());
        let state = filter.state.map(|s| s.trim().to_lowercase());

        let mut count_result = self
            .db
            .query(count_query)
            .bind(("kind", kind.clone()))
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
            .bind(("kind", kind))
            .bind(("specialization", specialization))
            .bind(("city", city))
            .bind(("state", state))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HospitalRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: collect_hospitals(rows)?,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn search(&self, query: &str, limit: u64) -> DocconResult<Vec<Hospital>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM hospital WHERE \
                 string::contains(string::lowercase(name), $q) \
                 OR string::contains(string::lowercase(city), $q) \
                 OR string::contains(string::lowercase(state), $q) \
                 OR string::contains(string::lowercase(address ?? ''), $q) \
                 ORDER BY name ASC LIMIT $limit",
            )
            .bind(("q", needle))
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HospitalRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect_hospitals(rows)?)
    }

    async fn specializations(&self) -> DocconResult<Vec<Specialty>> {
        let mut offered = BTreeSet::new();
        for row in self.facets().await? {
            offered.extend(parse_specialties(&row.specialties)?);
        }
        Ok(offered.into_iter().collect())
    }

    async fn stats(&self) -> DocconResult<HospitalStats> {
        let rows = self.facets().await?;

        let mut stats = HospitalStats {
            total: rows.len() as u64,
            ..Default::default()
        };
        let mut cities = BTreeSet::new();
        let mut states = BTreeSet::new();
        let mut specialties = BTreeSet::new();

        for row in rows {
            match parse_kind(&row.kind)? {
                HospitalKind::Government => stats.government += 1,
                HospitalKind::Private => stats.private += 1,
            }
            cities.insert(row.city.to_lowercase());
            states.insert(row.state.to_lowercase());
            specialties.extend(row.specialties);
        }

        stats.cities = cities.len() as u64;
        stats.states = states.len() as u64;
        stats.specializations = specialties.len() as u64;
        Ok(stats)
    }

    async fn count(&self) -> DocconResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM hospital GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
