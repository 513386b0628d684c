// security/src/registration.rs
//
// The registration pipeline. A registration request is only honored
// when it matches a pre-provisioned employee exactly; validation
// failures are reported one at a time, first failure wins. The
// uniqueness pre-checks here order the error messages for the form, but
// the store's insert transaction is what actually guarantees them.

use thiserror::Error;
use tracing::info;

use models::errors::ValidationError;
use models::{validation, NewUser, User};
use store::{IdentityStore, StoreError};

use crate::hash_password;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Internal server error: {0}")]
    Internal(String),
}

// Uniqueness violations surfacing from the store's insert transaction
// are user-correctable outcomes, not internal failures.
impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => RegistrationError::Invalid(ValidationError::EmailTaken),
            StoreError::DuplicateEmployeeId => {
                RegistrationError::Invalid(ValidationError::EmployeeIdTaken)
            }
            other => RegistrationError::Internal(other.to_string()),
        }
    }
}

/// Validates a registration request and creates the user credential.
///
/// Order of checks, each with its own failure reason: non-empty fields,
/// employee-id shape, email shape, password strength, roster
/// cross-check, then email/employee-id availability. On success the
/// password is hashed and the insert finalizes uniqueness atomically.
pub async fn register(
    identity: &dyn IdentityStore,
    employee_id: &str,
    email: &str,
    password: &str,
) -> Result<User, RegistrationError> {
    let employee_id = employee_id.trim();
    let email = email.trim();

    if employee_id.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields.into());
    }
    if !validation::is_valid_employee_id(employee_id) {
        return Err(ValidationError::InvalidEmployeeId.into());
    }
    if !validation::is_valid_email(email) {
        return Err(ValidationError::InvalidEmail.into());
    }
    if !validation::is_strong_password(password) {
        return Err(ValidationError::WeakPassword.into());
    }

    // The roster is the authorization source of truth: the submitted
    // pair must match a provisioned employee exactly.
    let provisioned = identity
        .employee_by_id(employee_id)
        .await?
        .filter(|employee| employee.email == email)
        .is_some();
    if !provisioned {
        return Err(ValidationError::NotProvisioned.into());
    }

    if identity.user_by_email(email).await?.is_some() {
        return Err(ValidationError::EmailTaken.into());
    }
    if identity.user_by_employee_id(employee_id).await?.is_some() {
        return Err(ValidationError::EmployeeIdTaken.into());
    }

    let password_hash =
        hash_password(password).map_err(|e| RegistrationError::Internal(e.to_string()))?;
    let user = identity
        .create_user(NewUser {
            employee_id: employee_id.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await?;

    info!(user_id = user.id, "registered user");
    Ok(user)
}
