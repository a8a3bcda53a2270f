//! Accounts and their role documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nagar_core::{Email, Role, UserId};

/// An authentication account.
///
/// The password hash never leaves the account store except for
/// verification.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The `users` document holding an account's role flags.
///
/// Written once at registration and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub is_admin: bool,
    pub is_entrepreneur: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// The effective role described by the stored flags.
    #[must_use]
    pub const fn role(&self) -> Role {
        Role::from_flags(self.is_admin, self.is_entrepreneur)
    }
}
