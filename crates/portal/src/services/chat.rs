//! Chat room service.
//!
//! The room shows the most recent messages in ascending time order. Live
//! updates are delivered as full snapshots: every change notification from
//! the backend triggers a fresh query, and the new list replaces the old one.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use thiserror::Error;

use nagar_core::DisplayName;

use crate::db::{DocumentStore, RepositoryError};
use crate::models::{ChatMessage, NewChatMessage};
use crate::storage::{MediaArea, ObjectKey, ObjectStorage, StorageError, UploadedImage};

/// Errors that can occur in the chat service.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Neither text nor an image was provided.
    #[error("message must contain text or an image")]
    EmptyMessage,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Image upload failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Chat room operations over the backend.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn ObjectStorage>,
    history: usize,
}

impl ChatService {
    /// Create a chat service showing the latest `history` messages.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStorage>,
        history: usize,
    ) -> Self {
        Self {
            store,
            storage,
            history,
        }
    }

    /// The latest messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Repository` if the query fails.
    pub async fn recent(&self) -> Result<Vec<ChatMessage>, ChatError> {
        snapshot(self.store.as_ref(), self.history).await
    }

    /// Subscribe to the room.
    ///
    /// Yields the current snapshot first, then a fresh snapshot after every
    /// change. Dropping the stream unsubscribes from the backend.
    pub fn subscribe(
        &self,
    ) -> impl Stream<Item = Result<Vec<ChatMessage>, ChatError>> + Send + use<> {
        let store = Arc::clone(&self.store);
        let history = self.history;

        async_stream::try_stream! {
            // Subscribe before the first query so no change is missed in between.
            let mut changes = store.watch_chat().await?;
            yield snapshot(store.as_ref(), history).await?;

            while changes.next().await.is_some() {
                yield snapshot(store.as_ref(), history).await?;
            }
        }
    }

    /// Post a message to the room.
    ///
    /// `text` is trimmed. The image, if any, is stored under
    /// `chat/<uuid>.<ext>` before the message is written.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyMessage` if both the trimmed text and the
    /// image are empty, or a backend error if a write fails.
    pub async fn send(
        &self,
        user_name: &DisplayName,
        text: &str,
        image: Option<UploadedImage>,
    ) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        let image = image.filter(|i| !i.is_empty());
        if text.is_empty() && image.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let image_url = match image {
            Some(image) => {
                let key = ObjectKey::random(MediaArea::Chat, &image.file_name);
                Some(image.store(self.storage.as_ref(), &key).await?)
            }
            None => None,
        };

        let message = self
            .store
            .insert_chat_message(NewChatMessage {
                user_name: user_name.clone(),
                text: text.to_owned(),
                image_url,
            })
            .await?;

        tracing::debug!(message_id = %message.id, "Chat message posted");
        Ok(message)
    }
}

/// Query the latest `history` messages and put them in ascending order.
async fn snapshot(
    store: &dyn DocumentStore,
    history: usize,
) -> Result<Vec<ChatMessage>, ChatError> {
    let mut messages = store.recent_chat_messages(history).await?;
    messages.reverse();
    Ok(messages)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;
    use futures::pin_mut;

    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::storage::MemoryObjectStorage;

    fn service(history: usize) -> (ChatService, Arc<MemoryObjectStorage>) {
        let storage = Arc::new(MemoryObjectStorage::new());
        let chat = ChatService::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::clone(&storage) as Arc<dyn ObjectStorage>,
            history,
        );
        (chat, storage)
    }

    fn name(s: &str) -> DisplayName {
        DisplayName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_send_trims_text() {
        let (chat, _) = service(50);
        let message = chat.send(&name("Asha"), "  namaste  ", None).await.unwrap();
        assert_eq!(message.text, "namaste");
        assert_eq!(message.user_name, "Asha");
        assert!(message.image_url.is_none());
    }

    #[tokio::test]
    async fn test_send_rejects_empty_message() {
        let (chat, _) = service(50);
        assert!(matches!(
            chat.send(&name("Asha"), "   ", None).await,
            Err(ChatError::EmptyMessage)
        ));

        let empty_file = UploadedImage {
            file_name: "x.png".to_owned(),
            content_type: "image/png".to_owned(),
            bytes: Bytes::new(),
        };
        assert!(matches!(
            chat.send(&name("Asha"), "", Some(empty_file)).await,
            Err(ChatError::EmptyMessage)
        ));
        assert!(chat.recent().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_only_message() {
        let (chat, storage) = service(50);
        let image = UploadedImage {
            file_name: "sunset.JPG".to_owned(),
            content_type: "image/jpeg".to_owned(),
            bytes: Bytes::from_static(b"\xff\xd8\xff"),
        };
        let message = chat.send(&name("Ravi"), "", Some(image)).await.unwrap();

        assert!(message.text.is_empty());
        let url = message.image_url.unwrap();
        assert!(url.starts_with("/media/chat/"));
        assert!(url.ends_with(".jpg"));
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_recent_is_capped_and_ascending() {
        let (chat, _) = service(3);
        for i in 0..5 {
            chat.send(&name("Asha"), &format!("m{i}"), None).await.unwrap();
        }
        let texts: Vec<_> = chat
            .recent()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, ["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_subscribe_yields_snapshot_after_each_send() {
        let (chat, _) = service(50);
        chat.send(&name("Asha"), "first", None).await.unwrap();

        let stream = chat.subscribe();
        pin_mut!(stream);

        let initial = stream.next().await.unwrap().unwrap();
        assert_eq!(initial.len(), 1);

        chat.send(&name("Ravi"), "second", None).await.unwrap();
        let updated = stream.next().await.unwrap().unwrap();
        let texts: Vec<_> = updated.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }
}
