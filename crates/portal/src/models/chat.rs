//! Chat room messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nagar_core::{ChatMessageId, DisplayName};

/// A stored chat message.
///
/// `text` may be empty when the message carries only an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub user_name: String,
    pub text: String,
    pub image_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A chat message about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    pub user_name: DisplayName,
    pub text: String,
    pub image_url: Option<String>,
}

impl NewChatMessage {
    /// Materialize the stored document with a fresh ID.
    #[must_use]
    pub fn into_message(self, timestamp: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id: ChatMessageId::generate(),
            user_name: self.user_name.into_inner(),
            text: self.text,
            image_url: self.image_url,
            timestamp,
        }
    }
}
