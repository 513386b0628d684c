// models/src/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- DTO for a user about to be created ---
// The registration pipeline builds one of these after the password has
// already been hashed; plaintext never reaches the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub employee_id: String,
    pub email: String,
    pub password_hash: String,
}

// --- Stored user struct ---
// A login credential bound 1:1 to an employee via the employee id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub employee_id: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Materializes the stored record from the DTO once the store has
    /// assigned a numeric id.
    pub fn from_new(id: u64, new_user: NewUser) -> Self {
        let now = Utc::now();
        User {
            id,
            employee_id: new_user.employee_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
