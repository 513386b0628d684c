// store/src/relational.rs
//
// Sled-backed relational-style store. Each logical table is a tree;
// unique columns get a secondary index tree mapping the column value to
// the primary key. Index claims and record writes happen inside one
// multi-tree transaction, so uniqueness is authoritative here no matter
// what the callers pre-checked.

use async_trait::async_trait;
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use std::path::Path;
use tracing::{debug, info};

use models::{Employee, NewPatient, NewUser, Page, Patient, PatientUpdate, RoleKind, User};

use crate::errors::{StoreError, StoreResult};
use crate::keys::id_key;
use crate::{IdentityStore, PatientStore};

const TREE_ROLES: &str = "roles";
const TREE_EMPLOYEES: &str = "employee";
const TREE_USERS: &str = "users";
const TREE_USERS_BY_EMAIL: &str = "users_by_email";
const TREE_USERS_BY_EMPLOYEE: &str = "users_by_employee";
const TREE_PATIENTS: &str = "patients_demographics";
const TREE_PATIENTS_BY_EMAIL: &str = "patients_by_email";

fn role_id(role: RoleKind) -> u64 {
    match role {
        RoleKind::SuperAdmin => 1,
        RoleKind::Doctor => 2,
        RoleKind::Nurse => 3,
    }
}

#[derive(Debug, Clone)]
pub struct SledRelationalStore {
    db: sled::Db,
    roles: sled::Tree,
    employees: sled::Tree,
    users: sled::Tree,
    users_by_email: sled::Tree,
    users_by_employee: sled::Tree,
    patients: sled::Tree,
    patients_by_email: sled::Tree,
}

impl SledRelationalStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        info!(path = %path.as_ref().display(), "opening relational store");
        Self::from_db(sled::open(path)?)
    }

    /// In-memory instance for tests.
    pub fn temporary() -> StoreResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        Ok(SledRelationalStore {
            roles: db.open_tree(TREE_ROLES)?,
            employees: db.open_tree(TREE_EMPLOYEES)?,
            users: db.open_tree(TREE_USERS)?,
            users_by_email: db.open_tree(TREE_USERS_BY_EMAIL)?,
            users_by_employee: db.open_tree(TREE_USERS_BY_EMPLOYEE)?,
            patients: db.open_tree(TREE_PATIENTS)?,
            patients_by_email: db.open_tree(TREE_PATIENTS_BY_EMAIL)?,
            db,
        })
    }

    fn next_id(&self) -> StoreResult<u64> {
        // sled ids start at 0; keep row ids positive.
        Ok(self.db.generate_id()? + 1)
    }
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn page_of<T>(
    iter: impl Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
    total: u64,
    page: usize,
    per_page: usize,
) -> StoreResult<Page<T>>
where
    T: serde::de::DeserializeOwned,
{
    let page = page.max(1);
    let mut items = Vec::with_capacity(per_page);
    for entry in iter.skip((page - 1) * per_page).take(per_page) {
        let (_, value) = entry?;
        items.push(decode(&value)?);
    }
    Ok(Page { items, page, per_page, total })
}

#[async_trait]
impl IdentityStore for SledRelationalStore {
    async fn ensure_role(&self, role: RoleKind) -> StoreResult<()> {
        let key = id_key(role_id(role));
        if self.roles.get(key)?.is_none() {
            self.roles.insert(key, serde_json::to_vec(&role)?)?;
        }
        Ok(())
    }

    async fn roles(&self) -> StoreResult<Vec<RoleKind>> {
        let mut roles = Vec::new();
        for entry in self.roles.iter() {
            let (_, value) = entry?;
            roles.push(decode(&value)?);
        }
        Ok(roles)
    }

    async fn upsert_employee(&self, employee: Employee) -> StoreResult<()> {
        self.employees
            .insert(employee.employee_id.as_bytes(), serde_json::to_vec(&employee)?)?;
        Ok(())
    }

    async fn employee_by_id(&self, employee_id: &str) -> StoreResult<Option<Employee>> {
        match self.employees.get(employee_id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn employee_count(&self) -> StoreResult<u64> {
        Ok(self.employees.len() as u64)
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let id = self.next_id()?;
        let user = User::from_new(id, new_user);
        let key = id_key(id);
        let record = serde_json::to_vec(&user)?;

        (&self.users, &self.users_by_email, &self.users_by_employee).transaction(
            |(users, by_email, by_employee)| {
                if by_email.get(user.email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::DuplicateEmail));
                }
                if by_employee.get(user.employee_id.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        StoreError::DuplicateEmployeeId,
                    ));
                }
                by_email.insert(user.email.as_bytes(), &key[..])?;
                by_employee.insert(user.employee_id.as_bytes(), &key[..])?;
                users.insert(&key[..], record.as_slice())?;
                Ok(())
            },
        )?;

        debug!(user_id = id, "created user credential");
        Ok(user)
    }

    async fn user_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        match self.users.get(id_key(id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        match self.users_by_email.get(email.as_bytes())? {
            Some(key) => match self.users.get(&key)? {
                Some(bytes) => Ok(Some(decode(&bytes)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    async fn user_by_employee_id(&self, employee_id: &str) -> StoreResult<Option<User>> {
        match self.users_by_employee.get(employee_id.as_bytes())? {
            Some(key) => match self.users.get(&key)? {
                Some(bytes) => Ok(Some(decode(&bytes)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    async fn list_users(&self, page: usize, per_page: usize) -> StoreResult<Page<User>> {
        // Ids are assigned monotonically, so reverse key order is
        // newest-first, matching the management view.
        page_of(self.users.iter().rev(), self.users.len() as u64, page, per_page)
    }

    async fn user_count(&self) -> StoreResult<u64> {
        Ok(self.users.len() as u64)
    }

    async fn set_user_active(&self, id: u64, active: bool) -> StoreResult<User> {
        let key = id_key(id);
        let mut user: User = match self.users.get(key)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(StoreError::NotFound("user")),
        };
        user.active = active;
        user.updated_at = chrono::Utc::now();
        self.users.insert(key, serde_json::to_vec(&user)?)?;
        Ok(user)
    }
}

#[async_trait]
impl PatientStore for SledRelationalStore {
    async fn create_patient(&self, new_patient: NewPatient) -> StoreResult<Patient> {
        let id = self.next_id()?;
        let patient = new_patient.into_patient(id);
        let key = id_key(id);
        let record = serde_json::to_vec(&patient)?;

        (&self.patients, &self.patients_by_email).transaction(|(patients, by_email)| {
            if by_email.get(patient.email.as_bytes())?.is_some() {
                return Err(ConflictableTransactionError::Abort(StoreError::DuplicateEmail));
            }
            by_email.insert(patient.email.as_bytes(), &key[..])?;
            patients.insert(&key[..], record.as_slice())?;
            Ok(())
        })?;

        debug!(patient_id = id, "registered patient");
        Ok(patient)
    }

    async fn patient_by_id(&self, id: u64) -> StoreResult<Option<Patient>> {
        match self.patients.get(id_key(id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn patient_exists(&self, id: u64) -> StoreResult<bool> {
        Ok(self.patients.contains_key(id_key(id))?)
    }

    async fn update_patient(&self, id: u64, update: PatientUpdate) -> StoreResult<Patient> {
        let key = id_key(id);
        let mut patient: Patient = match self.patients.get(key)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(StoreError::NotFound("patient")),
        };
        update.apply(&mut patient);
        self.patients.insert(key, serde_json::to_vec(&patient)?)?;
        Ok(patient)
    }

    async fn remove_patient_row(&self, id: u64) -> StoreResult<()> {
        let key = id_key(id);
        let patient: Patient = match self.patients.get(key)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(StoreError::NotFound("patient")),
        };
        (&self.patients, &self.patients_by_email).transaction(|(patients, by_email)| {
            by_email.remove(patient.email.as_bytes())?;
            patients.remove(&key[..])?;
            Ok::<_, ConflictableTransactionError<StoreError>>(())
        })?;
        Ok(())
    }

    async fn list_patients(&self, page: usize, per_page: usize) -> StoreResult<Page<Patient>> {
        page_of(self.patients.iter(), self.patients.len() as u64, page, per_page)
    }

    async fn patient_count(&self) -> StoreResult<u64> {
        Ok(self.patients.len() as u64)
    }
}
