//! `PostgreSQL` backend.
//!
//! # Tables (schema `portal`)
//!
//! - `accounts` - Email/password accounts
//! - `users` - Role documents
//! - `events`, `products`, `chat_messages` - Content collections
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! Chat inserts fire `pg_notify('chat_messages', id)` from a trigger. One
//! listener per store, started by the first `watch_chat`, holds a single
//! pooled connection and fans notifications out to every subscriber.

mod accounts;
mod chat;
mod events;
mod products;
mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::{OnceCell, broadcast};

use super::{CHAT_CHANNEL_CAPACITY, DocumentStore, RepositoryError};

/// Channel notified by the `chat_messages` insert trigger.
pub const CHAT_CHANNEL: &str = "chat_messages";

/// Backend over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    chat_changes: broadcast::Sender<()>,
    chat_listener: Arc<OnceCell<()>>,
}

impl PgDocumentStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let (chat_changes, _) = broadcast::channel(CHAT_CHANNEL_CAPACITY);
        Self {
            pool,
            chat_changes,
            chat_listener: Arc::new(OnceCell::new()),
        }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Convert a non-negative row count or limit into the `BIGINT` sqlx binds.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
