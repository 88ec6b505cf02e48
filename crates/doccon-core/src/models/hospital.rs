//! Hospital domain model.
//!
//! Hospitals are reference data: seeded by operators, read by everyone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::specialty::Specialty;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HospitalKind {
    #[default]
    Government,
    Private,
}

impl HospitalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HospitalKind::Government => "government",
            HospitalKind::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: HospitalKind,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    pub capacity: Option<u32>,
    /// Departments open to volunteer enrollment.
    pub specialties: Vec<Specialty>,
    pub facilities: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hospital {
    pub fn offers(&self, department: Specialty) -> bool {
        self.specialties.contains(&department)
    }

    pub fn summary(&self) -> HospitalSummary {
        HospitalSummary {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
        }
    }
}

/// The hospital fields attached to enrollments and certificates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HospitalSummary {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: String,
    pub state: String,
}

/// Fields required to create a hospital (seeding only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHospital {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: HospitalKind,
    #[serde(default)]
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub specialties: Vec<Specialty>,
    #[serde(default)]
    pub facilities: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HospitalFilter {
    #[serde(rename = "type")]
    pub kind: Option<HospitalKind>,
    pub specialization: Option<Specialty>,
    /// Case-insensitive substring match.
    pub city: Option<String>,
    /// Case-insensitive substring match.
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HospitalStats {
    pub total: u64,
    pub government: u64,
    pub private: u64,
    pub cities: u64,
    pub states: u64,
    pub specializations: u64,
}
