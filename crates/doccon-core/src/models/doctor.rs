//! Doctor domain model.
//!
//! A doctor is both the credential holder and the volunteer profile.
//! Administrators are doctors with [`DoctorRole::Admin`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::specialty::Specialty;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DoctorRole {
    #[default]
    Doctor,
    Admin,
}

impl DoctorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorRole::Doctor => "doctor",
            DoctorRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    /// Unique, stored lower-cased.
    pub email: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: String,
    pub specialization: Specialty,
    /// Unique medical license number.
    pub license_number: String,
    pub experience_years: u32,
    pub address: String,
    pub city: String,
    pub state: String,
    pub is_verified: bool,
    pub role: DoctorRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn is_admin(&self) -> bool {
        self.role == DoctorRole::Admin
    }

    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            specialization: self.specialization,
            license_number: self.license_number.clone(),
        }
    }

    /// The directory entry other doctors may see.
    pub fn public(&self) -> DoctorPublic {
        DoctorPublic {
            id: self.id,
            name: self.name.clone(),
            specialization: self.specialization,
            experience_years: self.experience_years,
            city: self.city.clone(),
            state: self.state.clone(),
            is_verified: self.is_verified,
        }
    }

    /// Drop the credential before handing the record to callers.
    pub fn without_credentials(mut self) -> Self {
        self.password_hash.clear();
        self
    }
}

/// The doctor fields attached to enrollments and certificates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialization: Specialty,
    pub license_number: String,
}

/// Public directory entry. Carries no contact or license details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorPublic {
    pub id: Uuid,
    pub name: String,
    pub specialization: Specialty,
    pub experience_years: u32,
    pub city: String,
    pub state: String,
    pub is_verified: bool,
}

/// Aggregate figures over every registered doctor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DoctorStats {
    pub total: u64,
    pub verified: u64,
    pub unverified: u64,
    /// Distinct cities, case-insensitive.
    pub cities: u64,
    /// Distinct states, case-insensitive.
    pub states: u64,
    pub specializations: u64,
    pub experience: ExperienceStats,
}

/// Experience spread in years. All zero when there are no doctors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceStats {
    pub avg_experience: f64,
    pub min_experience: u32,
    pub max_experience: u32,
}

/// Registration input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterDoctor {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    /// Raw password (length policy is enforced by the auth service).
    pub password: String,
    #[validate(length(min = 10, max = 15, message = "Please provide a valid phone number"))]
    pub phone: String,
    pub specialization: Specialty,
    #[validate(length(
        min = 5,
        max = 20,
        message = "License number must be between 5 and 20 characters"
    ))]
    pub license_number: String,
    #[validate(range(max = 50, message = "Experience years must be between 0 and 50"))]
    pub experience_years: u32,
    #[validate(length(
        min = 10,
        max = 200,
        message = "Address must be between 10 and 200 characters"
    ))]
    pub address: String,
    #[validate(length(min = 2, max = 50, message = "City must be between 2 and 50 characters"))]
    pub city: String,
    #[validate(length(min = 2, max = 50, message = "State must be between 2 and 50 characters"))]
    pub state: String,
}

/// Fields required by the store to create a doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctor {
    pub name: String,
    pub email: String,
    /// Raw password (will be hashed with Argon2id before storage).
    pub password: String,
    pub phone: String,
    pub specialization: Specialty,
    pub license_number: String,
    pub experience_years: u32,
    pub address: String,
    pub city: String,
    pub state: String,
}

impl From<RegisterDoctor> for CreateDoctor {
    fn from(input: RegisterDoctor) -> Self {
        Self {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password: input.password,
            phone: input.phone.trim().to_string(),
            specialization: input.specialization,
            license_number: input.license_number.trim().to_string(),
            experience_years: input.experience_years,
            address: input.address.trim().to_string(),
            city: input.city.trim().to_string(),
            state: input.state.trim().to_string(),
        }
    }
}

/// Profile edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct UpdateProfile {
    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,
    #[validate(length(min = 10, max = 15))]
    pub phone: Option<String>,
    #[validate(length(min = 10, max = 200))]
    pub address: Option<String>,
    #[validate(length(min = 2, max = 50))]
    pub city: Option<String>,
    #[validate(length(min = 2, max = 50))]
    pub state: Option<String>,
}

/// Store-level update.
#[derive(Debug, Clone, Default)]
pub struct UpdateDoctor {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub role: Option<DoctorRole>,
    pub is_verified: Option<bool>,
}

impl From<UpdateProfile> for UpdateDoctor {
    fn from(p: UpdateProfile) -> Self {
        Self {
            name: p.name,
            phone: p.phone,
            address: p.address,
            city: p.city,
            state: p.state,
            ..Default::default()
        }
    }
}

/// Listing filter, shared by the admin listing and the directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorFilter {
    pub specialization: Option<Specialty>,
    /// Case-insensitive substring match.
    pub city: Option<String>,
    /// Case-insensitive substring match.
    pub state: Option<String>,
}
