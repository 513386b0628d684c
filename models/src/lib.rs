// models/src/lib.rs

pub mod assessment;
pub mod contact;
pub mod employee;
pub mod errors;
pub mod patient;
pub mod roles;
pub mod user;
pub mod validation;

pub use assessment::{Assessment, AssessmentDraft, EverMarried, Flag, ResidenceType, SmokingStatus, WorkType};
pub use contact::{ContactDraft, EmergencyContact, Relationship};
pub use employee::Employee;
pub use errors::{ValidationError, ValidationResult};
pub use patient::{Gender, NewPatient, Patient, PatientUpdate};
pub use roles::RoleKind;
pub use user::{NewUser, User};

use serde::Serialize;

/// One page of a listing, as served by the paginated endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty(page: usize, per_page: usize) -> Self {
        Page { items: Vec::new(), page, per_page, total: 0 }
    }
}
