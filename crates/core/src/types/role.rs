//! Posting privileges derived from a user's role document.
//!
//! The `users` document stores two independent flags, `isAdmin` and
//! `isEntrepreneur`. Views never inspect the flags directly; they work with
//! the closed [`Role`] variant instead.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Effective role of the current visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Signed out, or signed in without any posting privilege.
    #[default]
    Guest,
    /// May post and delete events.
    Admin,
    /// May post products and delete their own listings.
    Entrepreneur,
    /// Both privileges.
    Both,
}

impl Role {
    /// Build a role from the two stored flags.
    #[must_use]
    pub const fn from_flags(is_admin: bool, is_entrepreneur: bool) -> Self {
        match (is_admin, is_entrepreneur) {
            (false, false) => Self::Guest,
            (true, false) => Self::Admin,
            (false, true) => Self::Entrepreneur,
            (true, true) => Self::Both,
        }
    }

    /// Whether this role may create and delete events.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::Both)
    }

    /// Whether this role may list products.
    #[must_use]
    pub const fn is_entrepreneur(self) -> bool {
        matches!(self, Self::Entrepreneur | Self::Both)
    }

    /// Human-readable label shown on the profile page.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Guest => "User",
            Self::Admin => "Administrator",
            Self::Entrepreneur => "Entrepreneur",
            Self::Both => "Administrator & Entrepreneur",
        }
    }
}

/// The role chosen on the registration form.
///
/// Registration grants exactly one privilege; it is never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationRole {
    /// Community administrator.
    Admin,
    /// Local business owner.
    Entrepreneur,
}

impl RegistrationRole {
    /// The `(is_admin, is_entrepreneur)` flags written to the role document.
    #[must_use]
    pub const fn flags(self) -> (bool, bool) {
        match self {
            Self::Admin => (true, false),
            Self::Entrepreneur => (false, true),
        }
    }

    /// The form value for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Entrepreneur => "entrepreneur",
        }
    }
}

impl From<RegistrationRole> for Role {
    fn from(role: RegistrationRole) -> Self {
        let (is_admin, is_entrepreneur) = role.flags();
        Self::from_flags(is_admin, is_entrepreneur)
    }
}

/// Error returned when a registration role string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for RegistrationRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "entrepreneur" => Ok(Self::Entrepreneur),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

impl fmt::Display for RegistrationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
