//! Nagar Core - Shared types library.
//!
//! This crate provides common types used across all Nagar components:
//! - `portal` - Community portal web application
//! - `cli` - Command-line tools for migrations, accounts and demo data
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, roles and
//!   chat display names
//! - [`validation`] - Field-level form validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::FieldErrors;
