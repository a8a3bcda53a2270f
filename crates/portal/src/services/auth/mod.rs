//! Authentication service.
//!
//! Provides email/password registration and sign-in over the account store,
//! and writes the role document chosen at registration.

mod error;
pub mod roles;

pub use error::{AuthError, LOGIN_FAILED_MESSAGE};
pub use roles::RoleCache;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;

use nagar_core::{Email, RegistrationRole};

use crate::db::{DocumentStore, RepositoryError};
use crate::models::{CurrentUser, UserProfile};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
///
/// Handles account registration and password sign-in.
pub struct AuthService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Register a new account with email, password and role.
    ///
    /// Creates the account, then writes its `users` role document. The
    /// caller signs the returned user in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::EmailAlreadyInUse` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: RegistrationRole,
    ) -> Result<CurrentUser, AuthError> {
        let email = normalize_email(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let account = self
            .store
            .create_account(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailAlreadyInUse,
                other => AuthError::Repository(other),
            })?;

        let (is_admin, is_entrepreneur) = role.flags();
        self.store
            .put_user_profile(&UserProfile {
                id: account.id,
                email: account.email.clone(),
                is_admin,
                is_entrepreneur,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = %account.id, role = %role, "Account registered");

        Ok(CurrentUser {
            id: account.id,
            email: account.email,
        })
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = normalize_email(email)?;

        let account = self
            .store
            .find_account_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)?;

        Ok(CurrentUser {
            id: account.id,
            email: account.email,
        })
    }
}

/// Lookups go through the normalized form, so they are case-insensitive.
fn normalize_email(email: &str) -> Result<Email, AuthError> {
    Ok(Email::normalized(email)?)
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nagar_core::Role;

    use super::*;
    use crate::db::{MemoryDocumentStore, UserStore};

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("chai-time").unwrap();
        assert!(verify_password("chai-time", &hash).is_ok());
        assert!(matches!(
            verify_password("coffee", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("12345"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("123456").is_ok());
    }

    #[tokio::test]
    async fn test_register_writes_role_document() {
        let store = MemoryDocumentStore::new();
        let auth = AuthService::new(&store);

        let user = auth
            .register("Asha@Example.com ", "secret1", RegistrationRole::Admin)
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "asha@example.com");

        let profile = store.get_user_profile(user.id).await.unwrap().unwrap();
        assert_eq!(profile.role(), Role::Admin);
        assert!(profile.is_admin);
        assert!(!profile.is_entrepreneur);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryDocumentStore::new();
        let auth = AuthService::new(&store);
        auth.register("ravi@example.com", "secret1", RegistrationRole::Entrepreneur)
            .await
            .unwrap();

        let err = auth
            .register("RAVI@example.com", "secret2", RegistrationRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyInUse));
        assert_eq!(
            err.registration_message(),
            "This email is already in use. Please use a different email or sign in."
        );
    }

    #[tokio::test]
    async fn test_login() {
        let store = MemoryDocumentStore::new();
        let auth = AuthService::new(&store);
        let registered = auth
            .register("meera@example.com", "secret1", RegistrationRole::Entrepreneur)
            .await
            .unwrap();

        let user = auth.login("meera@example.com", "secret1").await.unwrap();
        assert_eq!(user, registered);

        assert!(matches!(
            auth.login("meera@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
