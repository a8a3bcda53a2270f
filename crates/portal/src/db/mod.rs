//! Backend document store and account store.
//!
//! # Collections
//!
//! - `accounts` - Email/password accounts (unique email)
//! - `users` - Role document per account (`isAdmin`, `isEntrepreneur`)
//! - `events` - Community events
//! - `products` - Local product listings
//! - `chat` - Chat room messages, with a live change feed
//!
//! # Backends
//!
//! - [`postgres::PgDocumentStore`] - `PostgreSQL` tables in the `portal`
//!   schema; chat changes are pushed with `LISTEN`/`NOTIFY`
//! - [`memory::MemoryDocumentStore`] - In-process maps, used by tests and
//!   local demos
//!
//! # Migrations
//!
//! Migrations are stored in `crates/portal/migrations/` and run via:
//! ```bash
//! cargo run -p nagar-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::broadcast;

use nagar_core::{Email, EventId, ProductId, UserId};

use crate::models::{
    Account, ChatMessage, Event, NewChatMessage, NewEvent, NewProduct, Product, UserProfile,
};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Errors that can occur during backend operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Email/password accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create_account(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<Account, RepositoryError>;

    /// Look up an account by its (normalized) email.
    async fn find_account_by_email(&self, email: &Email)
    -> Result<Option<Account>, RepositoryError>;
}

/// The `users` role documents.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Write the role document for an account.
    async fn put_user_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError>;

    /// Fetch the role document for an account, if one was written.
    async fn get_user_profile(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError>;
}

/// The `events` collection.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events, ordered by date ascending.
    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError>;

    /// The `limit` events with the latest dates, latest first.
    async fn latest_events(&self, limit: usize) -> Result<Vec<Event>, RepositoryError>;

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError>;

    async fn insert_event(&self, event: NewEvent) -> Result<Event, RepositoryError>;

    /// Delete an event.
    ///
    /// Returns `true` if a document was removed.
    async fn delete_event(&self, id: EventId) -> Result<bool, RepositoryError>;
}

/// The `products` collection.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, newest listing first.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// The `limit` newest listings.
    async fn latest_products(&self, limit: usize) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Delete a product.
    ///
    /// Returns `true` if a document was removed.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// The `chat` collection and its change feed.
#[async_trait]
pub trait ChatFeed: Send + Sync {
    /// The `limit` most recent messages, newest first.
    async fn recent_chat_messages(&self, limit: usize)
    -> Result<Vec<ChatMessage>, RepositoryError>;

    async fn insert_chat_message(
        &self,
        message: NewChatMessage,
    ) -> Result<ChatMessage, RepositoryError>;

    /// Subscribe to changes of the collection.
    ///
    /// The subscription is active when this returns; the stream then yields
    /// once per change. It carries no payload, so subscribers re-query the
    /// collection. Dropping the stream unsubscribes.
    async fn watch_chat(&self) -> Result<BoxStream<'static, ()>, RepositoryError>;
}

/// A complete backend: every collection plus a readiness probe.
#[async_trait]
pub trait DocumentStore: AccountStore + UserStore + EventStore + ProductStore + ChatFeed {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Capacity of a chat change channel.
pub(crate) const CHAT_CHANNEL_CAPACITY: usize = 64;

/// Turn a broadcast receiver into a change feed stream.
///
/// A lagged receiver has missed notifications; one refresh covers them. The
/// stream ends when the sender is dropped.
pub(crate) fn change_stream(mut rx: broadcast::Receiver<()>) -> BoxStream<'static, ()> {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => yield (),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    .boxed()
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
