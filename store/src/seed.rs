// store/src/seed.rs
//
// Startup seeding: the canonical roles, a bootstrap super-admin
// employee + credential, and an optional employee roster file. All
// idempotent so restarts are safe.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use models::{Employee, NewUser, RoleKind};

use crate::errors::{StoreError, StoreResult};
use crate::IdentityStore;

/// One roster file entry, matching the bulk-import source shape.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

pub async fn ensure_roles(identity: &dyn IdentityStore) -> StoreResult<()> {
    for role in RoleKind::ALL {
        identity.ensure_role(role).await?;
    }
    Ok(())
}

/// Provisions the bootstrap super admin: a roster entry plus an active
/// credential with the given (already hashed) password. Does nothing if
/// the credential already exists.
pub async fn ensure_super_admin(
    identity: &dyn IdentityStore,
    employee_id: &str,
    email: &str,
    password_hash: String,
) -> StoreResult<bool> {
    if identity.user_by_email(email).await?.is_some() {
        return Ok(false);
    }
    if identity.employee_by_id(employee_id).await?.is_none() {
        identity
            .upsert_employee(Employee::new(employee_id, "Super", "Admin", email, RoleKind::SuperAdmin))
            .await?;
    }
    match identity
        .create_user(NewUser {
            employee_id: employee_id.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await
    {
        Ok(user) => {
            info!(user_id = user.id, "created bootstrap super admin");
            Ok(true)
        }
        // Lost a race with a concurrent bootstrap; the account exists.
        Err(StoreError::DuplicateEmail) | Err(StoreError::DuplicateEmployeeId) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Loads a JSON roster file and upserts every entry that is not already
/// provisioned. Entries with unknown roles are skipped with a warning
/// rather than failing the whole import.
pub async fn import_roster(
    identity: &dyn IdentityStore,
    path: impl AsRef<Path>,
) -> StoreResult<usize> {
    let raw = fs::read_to_string(&path)
        .map_err(|e| StoreError::Storage(format!("failed to read roster file: {e}")))?;
    let entries: Vec<RosterEntry> = serde_json::from_str(&raw)?;

    let mut imported = 0;
    for entry in entries {
        if identity.employee_by_id(&entry.employee_id).await?.is_some() {
            continue;
        }
        let role = match RoleKind::parse(&entry.role) {
            Ok(role) => role,
            Err(_) => {
                warn!(employee_id = %entry.employee_id, role = %entry.role, "skipping roster entry with unknown role");
                continue;
            }
        };
        identity
            .upsert_employee(Employee::new(
                entry.employee_id,
                entry.first_name,
                entry.last_name,
                entry.email,
                role,
            ))
            .await?;
        imported += 1;
    }
    if imported > 0 {
        info!(imported, "imported employee roster entries");
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SledRelationalStore;

    #[tokio::test]
    async fn should_seed_super_admin_once() {
        let store = SledRelationalStore::temporary().unwrap();
        ensure_roles(&store).await.unwrap();
        let first = ensure_super_admin(&store, "SA0001", "admin@x.com", "$hash".into())
            .await
            .unwrap();
        let second = ensure_super_admin(&store, "SA0001", "admin@x.com", "$hash".into())
            .await
            .unwrap();
        assert!(first);
        assert!(!second);
        assert_eq!(store.user_count().await.unwrap(), 1);
        assert_eq!(store.roles().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_import_roster_skipping_existing_and_unknown_roles() {
        let store = SledRelationalStore::temporary().unwrap();
        store
            .upsert_employee(Employee::new("EMP001", "Already", "There", "a@x.com", RoleKind::Nurse))
            .await
            .unwrap();

        let path = write_roster(
            r#"[
                {"employee_id":"EMP001","first_name":"A","last_name":"B","email":"a@x.com","role":"nurse"},
                {"employee_id":"EMP002","first_name":"C","last_name":"D","email":"c@x.com","role":"doctor"},
                {"employee_id":"EMP003","first_name":"E","last_name":"F","email":"e@x.com","role":"janitor"}
            ]"#,
        );
        let imported = import_roster(&store, &path).await.unwrap();
        assert_eq!(imported, 1);
        assert_eq!(store.employee_count().await.unwrap(), 2);
        assert!(store.employee_by_id("EMP003").await.unwrap().is_none());
        std::fs::remove_file(&path).ok();
    }

    fn write_roster(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("roster-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }
}
