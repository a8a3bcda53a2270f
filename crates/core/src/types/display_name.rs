//! Chat display name.
//!
//! The name is chosen by the visitor and stored client-side; it is not tied
//! to an account and is not authenticated.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`DisplayName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayNameError {
    /// Nothing but whitespace was entered.
    #[error("name cannot be empty")]
    Empty,
    /// The name is longer than allowed.
    #[error("name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },
}

/// A trimmed, non-empty chat display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 50;

    /// Parse a display name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or too long.
    pub fn parse(s: &str) -> Result<Self, DisplayNameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DisplayNameError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(DisplayNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The uppercased first character, used for avatars.
    #[must_use]
    pub fn initial(&self) -> String {
        self.0
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }

    /// Consumes the name and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        assert_eq!(DisplayName::parse("  Asha ").unwrap().as_str(), "Asha");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(DisplayName::parse(""), Err(DisplayNameError::Empty));
        assert_eq!(DisplayName::parse(" \t "), Err(DisplayNameError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "x".repeat(DisplayName::MAX_LENGTH + 1);
        assert!(matches!(
            DisplayName::parse(&long),
            Err(DisplayNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_initial() {
        assert_eq!(DisplayName::parse("ravi").unwrap().initial(), "R");
        assert_eq!(DisplayName::parse("élan").unwrap().initial(), "É");
    }
}
