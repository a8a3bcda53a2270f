//! Business logic services.

pub mod auth;
pub mod chat;

pub use auth::{AuthError, AuthService, RoleCache};
pub use chat::{ChatError, ChatService};
