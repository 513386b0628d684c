// models/src/employee.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::RoleKind;

/// A pre-provisioned roster entry. Employees are created by bulk import
/// and are immutable during normal operation; they are the
/// source-of-truth consulted when a registration request arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: RoleKind,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(
        employee_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        role: RoleKind,
    ) -> Self {
        Employee {
            employee_id: employee_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            role,
            created_at: Utc::now(),
        }
    }
}
