// security/src/accounts.rs

use thiserror::Error;
use tracing::info;

use models::{RoleKind, User};
use store::{IdentityStore, StoreError};

#[derive(Debug, Error)]
pub enum AccountError {
    /// Super-admin accounts cannot be deactivated or reactivated.
    #[error("Cannot change a super admin account")]
    SuperAdminImmutable,
    #[error("User not found")]
    NotFound,
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AccountError::NotFound,
            other => AccountError::Internal(other.to_string()),
        }
    }
}

/// Soft activation toggle. The credential is never deleted; the flag
/// decides whether `authenticate` will accept it.
pub async fn set_user_active(
    identity: &dyn IdentityStore,
    user_id: u64,
    active: bool,
) -> Result<User, AccountError> {
    let user = identity.user_by_id(user_id).await?.ok_or(AccountError::NotFound)?;
    let is_super_admin = identity
        .employee_by_id(&user.employee_id)
        .await?
        .is_some_and(|employee| employee.role == RoleKind::SuperAdmin);
    if is_super_admin {
        return Err(AccountError::SuperAdminImmutable);
    }
    let user = identity.set_user_active(user_id, active).await?;
    info!(user_id, active, "changed account activation");
    Ok(user)
}
