//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Message shown on the sign-in form for any failure.
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid email or password. Please try again.";

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] nagar_core::EmailError),

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("email already in use")]
    EmailAlreadyInUse,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message shown on the registration form for this failure.
    #[must_use]
    pub const fn registration_message(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => {
                "This email is already in use. Please use a different email or sign in."
            }
            Self::InvalidEmail(_) => "Invalid email address",
            Self::WeakPassword(_) => "Password must be at least 6 characters",
            _ => "Failed to create account. Please try again.",
        }
    }
}
