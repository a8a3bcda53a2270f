//! Authentication route handlers.
//!
//! Handles sign-in, registration and sign-out with email and password.
//! Failed submissions re-render the form with the visitor's input and a
//! message; nothing is written.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use nagar_core::{FieldErrors, Role};

use super::rejected;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{LoginForm, RegisterForm};
use crate::middleware::{Viewer, clear_current_user, set_current_user};
use crate::services::auth::LOGIN_FAILED_MESSAGE;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub viewer: Viewer,
    pub email: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub viewer: Viewer,
    pub email: String,
    pub role: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(viewer: Viewer) -> LoginTemplate {
    LoginTemplate {
        viewer,
        email: String::new(),
        errors: FieldErrors::new(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    viewer: Viewer,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if let Err(errors) = form.validate() {
        return Ok(rejected(LoginTemplate {
            viewer,
            email: form.email,
            errors,
            error: None,
        }));
    }

    let user = match AuthService::new(state.store())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            if matches!(e, AuthError::Repository(_) | AuthError::PasswordHash) {
                tracing::error!(error = %e, "Login failed");
            } else {
                tracing::warn!(error = %e, "Login rejected");
            }
            return Ok(rejected(LoginTemplate {
                viewer,
                email: form.email,
                errors: FieldErrors::new(),
                error: Some(LOGIN_FAILED_MESSAGE.to_owned()),
            }));
        }
    };

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id);
    tracing::info!(user_id = %user.id, "Signed in");

    Ok(Redirect::to("/profile").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(viewer: Viewer) -> RegisterTemplate {
    RegisterTemplate {
        viewer,
        email: String::new(),
        role: String::new(),
        errors: FieldErrors::new(),
        error: None,
    }
}

/// Handle registration form submission.
///
/// Creates the account and its role document, then signs the user in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    viewer: Viewer,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(errors) => {
            return Ok(rejected(RegisterTemplate {
                viewer,
                email: form.email,
                role: form.role,
                errors,
                error: None,
            }));
        }
    };

    let user = match AuthService::new(state.store())
        .register(
            &registration.email,
            &registration.password,
            registration.role,
        )
        .await
    {
        Ok(user) => user,
        Err(e) => {
            if matches!(e, AuthError::Repository(_) | AuthError::PasswordHash) {
                tracing::error!(error = %e, "Registration failed");
            } else {
                tracing::warn!(error = %e, "Registration rejected");
            }
            return Ok(rejected(RegisterTemplate {
                viewer,
                email: form.email,
                role: form.role,
                errors: FieldErrors::new(),
                error: Some(e.registration_message().to_owned()),
            }));
        }
    };

    state
        .roles()
        .prime(user.id, Role::from(registration.role))
        .await;
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id);

    Ok(Redirect::to("/profile").into_response())
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout: clear the session and go home.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/")
}
