// store/src/lib.rs
//
// Persistence for the two disjoint stores: a relational-style embedded
// database for identity and demographics, and a separate document
// database for assessments and emergency contacts. Nothing here spans
// both databases in one transaction; the cross-store delete ordering
// lives in `cascade`.

pub mod cascade;
pub mod documents;
pub mod errors;
pub mod keys;
pub mod relational;
pub mod seed;

pub use cascade::{delete_patient, sweep_orphans, CascadeReport, SweepReport};
pub use documents::SledDocumentStore;
pub use errors::{StoreError, StoreResult};
pub use relational::SledRelationalStore;

use std::collections::BTreeSet;

use async_trait::async_trait;
use uuid::Uuid;

use models::{
    Assessment, EmergencyContact, Employee, NewPatient, NewUser, Page, Patient, PatientUpdate,
    RoleKind, User,
};

/// Identity-side operations: the role table, the pre-provisioned
/// employee roster, and user credentials. Uniqueness of user email and
/// employee id is enforced here, atomically with the insert.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn ensure_role(&self, role: RoleKind) -> StoreResult<()>;
    async fn roles(&self) -> StoreResult<Vec<RoleKind>>;

    async fn upsert_employee(&self, employee: Employee) -> StoreResult<()>;
    async fn employee_by_id(&self, employee_id: &str) -> StoreResult<Option<Employee>>;
    async fn employee_count(&self) -> StoreResult<u64>;

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: u64) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn user_by_employee_id(&self, employee_id: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self, page: usize, per_page: usize) -> StoreResult<Page<User>>;
    async fn user_count(&self) -> StoreResult<u64>;
    async fn set_user_active(&self, id: u64, active: bool) -> StoreResult<User>;
}

/// Patient demographics. Email uniqueness is enforced at insert time;
/// updates touch demographic fields only and never the email.
#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn create_patient(&self, new_patient: NewPatient) -> StoreResult<Patient>;
    async fn patient_by_id(&self, id: u64) -> StoreResult<Option<Patient>>;
    async fn patient_exists(&self, id: u64) -> StoreResult<bool>;
    async fn update_patient(&self, id: u64, update: PatientUpdate) -> StoreResult<Patient>;
    async fn remove_patient_row(&self, id: u64) -> StoreResult<()>;
    async fn list_patients(&self, page: usize, per_page: usize) -> StoreResult<Page<Patient>>;
    async fn patient_count(&self) -> StoreResult<u64>;
}

/// The schema-flexible document collections. Documents reference
/// patients by numeric id only; the reference is a soft foreign key
/// with no store-level enforcement.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_assessment(&self, assessment: Assessment) -> StoreResult<Assessment>;
    async fn assessments_for(&self, patient_id: u64) -> StoreResult<Vec<Assessment>>;
    async fn assessment_count(&self) -> StoreResult<u64>;
    async fn delete_assessments_for(&self, patient_id: u64) -> StoreResult<u64>;

    /// Inserts a contact, refusing once the patient already holds
    /// `MAX_CONTACTS_PER_PATIENT` of them.
    async fn insert_contact(&self, contact: EmergencyContact) -> StoreResult<EmergencyContact>;
    async fn contact_by_id(
        &self,
        patient_id: u64,
        contact_id: Uuid,
    ) -> StoreResult<Option<EmergencyContact>>;
    async fn put_contact(&self, contact: EmergencyContact) -> StoreResult<()>;
    async fn delete_contact(&self, patient_id: u64, contact_id: Uuid) -> StoreResult<()>;
    async fn contacts_for(&self, patient_id: u64) -> StoreResult<Vec<EmergencyContact>>;
    async fn delete_contacts_for(&self, patient_id: u64) -> StoreResult<u64>;

    /// Every patient id any document still references; input to the
    /// orphan sweep.
    async fn referenced_patient_ids(&self) -> StoreResult<BTreeSet<u64>>;
}
