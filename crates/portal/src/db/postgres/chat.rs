//! Chat queries and the `LISTEN`-based change feed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use sqlx::postgres::PgListener;
use tokio::sync::broadcast;
use tracing::instrument;
use uuid::Uuid;

use nagar_core::ChatMessageId;

use super::{CHAT_CHANNEL, PgDocumentStore, sql_limit};
use crate::db::{ChatFeed, RepositoryError, change_stream};

/// Pause before retrying after the listener failed to reconnect.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
use crate::models::{ChatMessage, NewChatMessage};

#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: Uuid,
    user_name: String,
    text: String,
    image_url: Option<String>,
    timestamp: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: ChatMessageId::new(row.id),
            user_name: row.user_name,
            text: row.text,
            image_url: row.image_url,
            timestamp: row.timestamp,
        }
    }
}

#[async_trait]
impl ChatFeed for PgDocumentStore {
    #[instrument(skip(self))]
    async fn recent_chat_messages(
        &self,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r"
            SELECT id, user_name, text, image_url, timestamp
            FROM portal.chat_messages
            ORDER BY timestamp DESC
            LIMIT $1
            ",
        )
        .bind(sql_limit(limit))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    #[instrument(skip(self, message), fields(user_name = %message.user_name))]
    async fn insert_chat_message(
        &self,
        message: NewChatMessage,
    ) -> Result<ChatMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r"
            INSERT INTO portal.chat_messages (id, user_name, text, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_name, text, image_url, timestamp
            ",
        )
        .bind(ChatMessageId::generate().as_uuid())
        .bind(message.user_name.as_str())
        .bind(&message.text)
        .bind(&message.image_url)
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }

    async fn watch_chat(&self) -> Result<BoxStream<'static, ()>, RepositoryError> {
        self.chat_listener
            .get_or_try_init(|| async {
                let mut listener = PgListener::connect_with(self.pool()).await?;
                listener.listen(CHAT_CHANNEL).await?;
                tokio::spawn(forward_notifications(listener, self.chat_changes.clone()));
                tracing::info!(channel = CHAT_CHANNEL, "Chat listener started");
                Ok::<_, RepositoryError>(())
            })
            .await?;

        Ok(change_stream(self.chat_changes.subscribe()))
    }
}

/// Relay every notification on the chat channel to the store's subscribers.
///
/// `PgListener` reconnects on its own. Notifications sent while it was
/// disconnected are lost, so a reconnect is announced as a change too.
async fn forward_notifications(mut listener: PgListener, changes: broadcast::Sender<()>) {
    loop {
        match listener.try_recv().await {
            Ok(Some(_)) => {
                // No subscribers is fine.
                let _ = changes.send(());
            }
            Ok(None) => {
                tracing::warn!("Chat listener connection lost, reconnecting");
                let _ = changes.send(());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat listener failed to reconnect");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::db::DocumentStore;

    /// Requires a reachable `PostgreSQL` at `DATABASE_URL`.
    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_subscribers_share_one_connection() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(2))
            .connect(&url)
            .await
            .unwrap();
        let store = PgDocumentStore::new(pool);

        let mut feeds = Vec::new();
        for _ in 0..5 {
            feeds.push(store.watch_chat().await.unwrap());
        }

        store.ping().await.unwrap();
        assert_eq!(store.chat_changes.receiver_count(), 5);
    }
}
