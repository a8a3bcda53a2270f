//! Sign-in and registration forms.

use serde::Deserialize;

use nagar_core::{Email, FieldErrors, RegistrationRole};

use crate::services::auth::MIN_PASSWORD_LENGTH;

/// Sign-in form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Check that both fields are filled in and the email is well formed.
    ///
    /// # Errors
    ///
    /// Returns every failing field when any rule is broken.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, &self.email);
        errors.require("password", &self.password, "Password is required");
        errors.into_result(())
    }
}

/// Registration form data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

/// A validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub role: RegistrationRole,
}

impl RegisterForm {
    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns every failing field when any rule is broken.
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();

        check_email(&mut errors, &self.email);

        if errors.require("password", &self.password, "Password is required")
            && self.password.chars().count() < MIN_PASSWORD_LENGTH
        {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }

        if errors.require(
            "confirm_password",
            &self.confirm_password,
            "Please confirm your password",
        ) && self.confirm_password != self.password
        {
            errors.add("confirm_password", "Passwords do not match");
        }

        let role = self.role.trim().parse::<RegistrationRole>().ok();
        if role.is_none() {
            errors.add("role", "Please select a role");
        }

        match role {
            Some(role) if errors.is_empty() => Ok(Registration {
                email: self.email.trim().to_owned(),
                password: self.password.clone(),
                role,
            }),
            _ => Err(errors),
        }
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if errors.require("email", email, "Email is required") && Email::parse(email.trim()).is_err() {
        errors.add("email", "Invalid email address");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> RegisterForm {
        RegisterForm {
            email: "asha@example.com".to_owned(),
            password: "secret1".to_owned(),
            confirm_password: "secret1".to_owned(),
            role: "admin".to_owned(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let registration = valid().validate().unwrap();
        assert_eq!(registration.role, RegistrationRole::Admin);
        assert_eq!(registration.email, "asha@example.com");
    }

    #[test]
    fn test_invalid_email() {
        let form = RegisterForm {
            email: "asha@localhost".to_owned(),
            ..valid()
        };
        assert_eq!(
            form.validate().unwrap_err().get("email"),
            Some("Invalid email address")
        );
    }

    #[test]
    fn test_short_password_and_mismatch() {
        let form = RegisterForm {
            password: "abc".to_owned(),
            confirm_password: "abd".to_owned(),
            ..valid()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match"));
    }

    #[test]
    fn test_role_required() {
        for role in ["", "moderator"] {
            let form = RegisterForm {
                role: role.to_owned(),
                ..valid()
            };
            assert_eq!(
                form.validate().unwrap_err().get("role"),
                Some("Please select a role")
            );
        }
    }

    #[test]
    fn test_login_form() {
        let empty = LoginForm::default().validate().unwrap_err();
        assert_eq!(empty.get("email"), Some("Email is required"));
        assert_eq!(empty.get("password"), Some("Password is required"));

        let ok = LoginForm {
            email: "asha@example.com".to_owned(),
            password: "x".to_owned(),
        };
        assert!(ok.validate().is_ok());
    }
}
