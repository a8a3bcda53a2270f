//! Domain models for the portal.
//!
//! These are the documents read from and written to the backend as-is. No
//! invariants are enforced beyond the required fields checked when a form is
//! submitted.

pub mod chat;
pub mod event;
pub mod product;
pub mod session;
pub mod user;

pub use chat::{ChatMessage, NewChatMessage};
pub use event::{Event, NewEvent};
pub use product::{NewProduct, Product};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Account, UserProfile};
