// security/src/identity.rs

use serde::Serialize;

use models::{Employee, RoleKind, User};
use store::{IdentityStore, StoreResult};

/// The resolved (user + employee + role) view used for authorization
/// decisions. Built fresh from the identity store on every guarded
/// request; never cached in session state.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub user: User,
    pub employee: Employee,
}

impl Identity {
    pub fn role(&self) -> RoleKind {
        self.employee.role
    }

    pub fn is_super_admin(&self) -> bool {
        self.employee.role == RoleKind::SuperAdmin
    }

    pub fn is_doctor(&self) -> bool {
        self.employee.role == RoleKind::Doctor
    }

    pub fn is_nurse(&self) -> bool {
        self.employee.role == RoleKind::Nurse
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.employee.first_name, self.employee.last_name)
    }
}

/// Joins the user credential to its employee roster entry. Returns
/// `None` when the chain is broken anywhere: unknown user id, a
/// deactivated account, or a credential whose employee has vanished.
pub async fn resolve_identity(
    store: &dyn IdentityStore,
    user_id: u64,
) -> StoreResult<Option<Identity>> {
    let Some(user) = store.user_by_id(user_id).await? else {
        return Ok(None);
    };
    if !user.active {
        return Ok(None);
    }
    let Some(employee) = store.employee_by_id(&user.employee_id).await? else {
        return Ok(None);
    };
    Ok(Some(Identity { user, employee }))
}

/// Where a fresh login lands, as a pure function of role.
pub fn landing_route(identity: Option<&Identity>) -> &'static str {
    match identity.map(Identity::role) {
        Some(RoleKind::SuperAdmin) => "/users-management",
        Some(RoleKind::Doctor) | Some(RoleKind::Nurse) => "/patient-management",
        None => "/",
    }
}
