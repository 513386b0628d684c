// models/src/roles.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// The closed set of roles. Every employee holds exactly one, and the
/// wire representation is the single canonical lower-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    #[serde(rename = "super admin")]
    SuperAdmin,
    #[serde(rename = "doctor")]
    Doctor,
    #[serde(rename = "nurse")]
    Nurse,
}

impl RoleKind {
    pub const ALL: [RoleKind; 3] = [RoleKind::SuperAdmin, RoleKind::Doctor, RoleKind::Nurse];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::SuperAdmin => "super admin",
            RoleKind::Doctor => "doctor",
            RoleKind::Nurse => "nurse",
        }
    }

    /// Parses a role name. Accepts hyphen/underscore spellings and any
    /// casing, but always normalizes to the canonical variant.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "super admin" | "superadmin" => Ok(RoleKind::SuperAdmin),
            "doctor" => Ok(RoleKind::Doctor),
            "nurse" => Ok(RoleKind::Nurse),
            _ => Err(ValidationError::UnknownRole(value.to_string())),
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleKind::parse(s)
    }
}
