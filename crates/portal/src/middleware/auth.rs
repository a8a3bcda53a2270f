//! Authentication extractors.
//!
//! [`Viewer`] is the per-request session context: the signed-in user (if
//! any) and their resolved role. Every page takes it as an extractor, so
//! rendering always happens after the session has been resolved.
//!
//! [`RequireAuth`], [`RequireAdmin`] and [`RequireEntrepreneur`] gate
//! actions. Guests are sent to the sign-in page; signed-in users without the
//! privilege get `403 Forbidden`. Either way the handler never runs, so no
//! write happens.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use nagar_core::{Role, UserId};

use crate::error::set_sentry_user;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// The resolved session context for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    /// The signed-in user, if any.
    pub user: Option<CurrentUser>,
    /// Effective role; [`Role::Guest`] when signed out.
    pub role: Role,
}

impl Viewer {
    /// A signed-out visitor.
    #[must_use]
    pub fn guest() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    #[must_use]
    pub const fn is_entrepreneur(&self) -> bool {
        self.role.is_entrepreneur()
    }

    /// ID of the signed-in user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Resolved once per request, even when several extractors ask.
        if let Some(viewer) = parts.extensions.get::<Self>() {
            return Ok(viewer.clone());
        }

        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to read session");
                    None
                }),
            None => None,
        };

        let role = match &user {
            Some(user) => {
                set_sentry_user(&user.id);
                state.roles().resolve(state.store(), user.id).await
            }
            None => Role::Guest,
        };

        let viewer = Self { user, role };
        parts.extensions.insert(viewer.clone());
        Ok(viewer)
    }
}

/// Error returned when an action's gate rejects the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Not signed in: redirect to the sign-in page.
    RedirectToLogin,
    /// Signed in without the needed privilege.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to do that.",
            )
                .into_response(),
        }
    }
}

/// Check `viewer` against a privilege predicate.
fn gate(viewer: Viewer, allowed: impl FnOnce(Role) -> bool) -> Result<CurrentUser, AuthRejection> {
    let Some(user) = viewer.user else {
        return Err(AuthRejection::RedirectToLogin);
    };
    if allowed(viewer.role) {
        Ok(user)
    } else {
        Err(AuthRejection::Forbidden)
    }
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(viewer) = Viewer::from_request_parts(parts, state).await;
        gate(viewer, |_| true).map(Self)
    }
}

/// Extractor that requires an administrator.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(viewer) = Viewer::from_request_parts(parts, state).await;
        gate(viewer, Role::is_admin).map(Self)
    }
}

/// Extractor that requires an entrepreneur.
pub struct RequireEntrepreneur(pub CurrentUser);

impl FromRequestParts<AppState> for RequireEntrepreneur {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(viewer) = Viewer::from_request_parts(parts, state).await;
        gate(viewer, Role::is_entrepreneur).map(Self)
    }
}

/// Sign `user` in on this session.
///
/// The session ID is rotated first so a pre-authentication ID cannot be
/// reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Sign out: clear all session data and delete the stored session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
