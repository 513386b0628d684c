// security/src/lib.rs

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use std::fmt;

use models::User;
use store::{IdentityStore, StoreError};

pub mod accounts;
pub mod identity;
pub mod middleware;
pub mod registration;
pub mod session;

pub use accounts::{set_user_active, AccountError};
pub use identity::{landing_route, resolve_identity, Identity};
pub use middleware::{
    require_role, GuardContext, DOCTOR_ONLY, DOCTOR_OR_NURSE, HEALTH_PROFESSIONALS,
    SUPER_ADMIN_ONLY,
};
pub use registration::{register, RegistrationError};
pub use session::{SessionSigner, SESSION_COOKIE};

/// Custom authentication errors.
#[derive(Debug)]
pub enum AuthError {
    /// Missing user or hash mismatch; deliberately indistinguishable.
    InvalidCredentials,
    /// Correct credentials on a deactivated account.
    AccountInactive,
    SessionInvalid,
    InternalError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::AccountInactive => write!(f, "This account has been deactivated"),
            AuthError::SessionInvalid => write!(f, "Session is missing or invalid"),
            AuthError::InternalError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Hashes a password using Argon2 with a fresh per-call salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against a stored Argon2 hash.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AuthError> {
    let password_hash = PasswordHash::new(hashed_password)
        .map_err(|e| AuthError::InternalError(format!("Failed to parse password hash: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &password_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::InternalError(format!("Failed to verify password: {}", e))),
    }
}

/// Validates a credential pair against the identity store. The email
/// lookup is exact; a missing user and a wrong password produce the
/// same error. The active flag is only consulted once the password has
/// verified, so a deactivated account leaks nothing to a guesser.
pub async fn authenticate(
    identity: &dyn IdentityStore,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = identity
        .user_by_email(email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }
    if !user.active {
        return Err(AuthError::AccountInactive);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::NewUser;
    use store::SledRelationalStore;

    async fn store_with_user(email: &str, password: &str, active: bool) -> SledRelationalStore {
        let store = SledRelationalStore::temporary().unwrap();
        let user = store
            .create_user(NewUser {
                employee_id: "ABC123".to_string(),
                email: email.to_string(),
                password_hash: hash_password(password).unwrap(),
            })
            .await
            .unwrap();
        if !active {
            store.set_user_active(user.id, false).await.unwrap();
        }
        store
    }

    #[test]
    fn should_salt_each_hash_independently() {
        let a = hash_password("Abcdef1!").unwrap();
        let b = hash_password("Abcdef1!").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("Abcdef1!", &a).unwrap());
        assert!(verify_password("Abcdef1!", &b).unwrap());
        assert!(!verify_password("Abcdef2!", &a).unwrap());
    }

    #[tokio::test]
    async fn should_authenticate_valid_credentials() {
        let store = store_with_user("a@x.com", "Abcdef1!", true).await;
        let user = authenticate(&store, "a@x.com", "Abcdef1!").await.unwrap();
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn should_not_leak_which_factor_failed() {
        let store = store_with_user("a@x.com", "Abcdef1!", true).await;
        let wrong_password = authenticate(&store, "a@x.com", "Nope1234!").await.unwrap_err();
        let unknown_user = authenticate(&store, "ghost@x.com", "Abcdef1!").await.unwrap_err();
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn should_report_inactive_account_distinctly() {
        let store = store_with_user("a@x.com", "Abcdef1!", false).await;
        let err = authenticate(&store, "a@x.com", "Abcdef1!").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountInactive));
        // Wrong password on an inactive account still reads as invalid
        // credentials.
        let err = authenticate(&store, "a@x.com", "Nope1234!").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn should_match_email_case_sensitively() {
        let store = store_with_user("a@x.com", "Abcdef1!", true).await;
        let err = authenticate(&store, "A@x.com", "Abcdef1!").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
