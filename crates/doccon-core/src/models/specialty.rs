//! Medical specialty, shared by doctor specialization and hospital
//! departments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocconError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Specialty {
    Cardiology,
    Neurology,
    Orthopedics,
    Pediatrics,
    Oncology,
    Psychiatry,
    #[serde(rename = "General Medicine")]
    GeneralMedicine,
    Surgery,
    #[serde(rename = "Emergency Medicine")]
    EmergencyMedicine,
    Radiology,
    Anesthesiology,
    Dermatology,
    Gynecology,
    Ophthalmology,
    #[serde(rename = "ENT")]
    Ent,
    Urology,
}

impl Specialty {
    pub const ALL: [Specialty; 16] = [
        Specialty::Cardiology,
        Specialty::Neurology,
        Specialty::Orthopedics,
        Specialty::Pediatrics,
        Specialty::Oncology,
        Specialty::Psychiatry,
        Specialty::GeneralMedicine,
        Specialty::Surgery,
        Specialty::EmergencyMedicine,
        Specialty::Radiology,
        Specialty::Anesthesiology,
        Specialty::Dermatology,
        Specialty::Gynecology,
        Specialty::Ophthalmology,
        Specialty::Ent,
        Specialty::Urology,
    ];

    /// Display name, also the stored and serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::Cardiology => "Cardiology",
            Specialty::Neurology => "Neurology",
            Specialty::Orthopedics => "Orthopedics",
            Specialty::Pediatrics => "Pediatrics",
            Specialty::Oncology => "Oncology",
            Specialty::Psychiatry => "Psychiatry",
            Specialty::GeneralMedicine => "General Medicine",
            Specialty::Surgery => "Surgery",
            Specialty::EmergencyMedicine => "Emergency Medicine",
            Specialty::Radiology => "Radiology",
            Specialty::Anesthesiology => "Anesthesiology",
            Specialty::Dermatology => "Dermatology",
            Specialty::Gynecology => "Gynecology",
            Specialty::Ophthalmology => "Ophthalmology",
            Specialty::Ent => "ENT",
            Specialty::Urology => "Urology",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specialty {
    type Err = DocconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specialty::ALL
            .into_iter()
            .find(|sp| sp.as_str() == s)
            .ok_or_else(|| DocconError::validation(format!("unknown specialty: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_round_trips_through_from_str() {
        for sp in Specialty::ALL {
            assert_eq!(sp.as_str().parse::<Specialty>().unwrap(), sp);
        }
    }

    #[test]
    fn serde_uses_display_name() {
        let json = serde_json::to_string(&Specialty::GeneralMedicine).unwrap();
        assert_eq!(json, "\"General Medicine\"");
        let parsed: Specialty = serde_json::from_str("\"ENT\"").unwrap();
        assert_eq!(parsed, Specialty::Ent);
    }

    #[test]
    fn unknown_name_is_a_validation_error() {
        let err = "Dentistry".parse::<Specialty>().unwrap_err();
        assert!(matches!(err, DocconError::Validation { .. }));
    }
}
