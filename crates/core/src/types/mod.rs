//! Core types for Nagar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod display_name;
pub mod email;
pub mod id;
pub mod price;
pub mod role;

pub use display_name::{DisplayName, DisplayNameError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::{RegistrationRole, Role, UnknownRole};
