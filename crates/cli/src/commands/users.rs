//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! nagar-cli users create -e asha@example.com -p secret1 -r admin
//! ```

use thiserror::Error;

use nagar_core::{RegistrationRole, UnknownRole};
use nagar_portal::db::PgDocumentStore;
use nagar_portal::services::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("{0}. Valid roles: admin, entrepreneur")]
    InvalidRole(#[from] UnknownRole),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new account with its role document.
///
/// Goes through the same registration path as the web form, so the email
/// is normalized and the password rules apply.
pub async fn create(email: &str, password: &str, role: &str) -> Result<(), UserError> {
    let role: RegistrationRole = role.parse()?;

    let store = PgDocumentStore::new(connect().await?);
    let user = AuthService::new(&store)
        .register(email, password, role)
        .await?;

    tracing::info!(
        "Account created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        role
    );
    Ok(())
}
