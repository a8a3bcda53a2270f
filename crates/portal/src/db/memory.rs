//! In-process backend.
//!
//! Holds every collection in memory behind a single `RwLock`. Chat inserts
//! are announced on a broadcast channel so `watch_chat` subscribers see them
//! immediately. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::BoxStream;
use tokio::sync::{RwLock, broadcast};

use nagar_core::{Email, EventId, ProductId, UserId};

use super::{
    AccountStore, CHAT_CHANNEL_CAPACITY, ChatFeed, DocumentStore, EventStore, ProductStore,
    RepositoryError, UserStore, change_stream,
};
use crate::models::{
    Account, ChatMessage, Event, NewChatMessage, NewEvent, NewProduct, Product, UserProfile,
};


#[derive(Default)]
struct Collections {
    accounts: HashMap<UserId, Account>,
    users: HashMap<UserId, UserProfile>,
    events: Vec<Event>,
    products: Vec<Product>,
    chat: Vec<ChatMessage>,
}

/// Backend that keeps every document in process memory.
pub struct MemoryDocumentStore {
    data: RwLock<Collections>,
    chat_changes: broadcast::Sender<()>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (chat_changes, _) = broadcast::channel(CHAT_CHANNEL_CAPACITY);
        Self {
            data: RwLock::new(Collections::default()),
            chat_changes,
        }
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryDocumentStore {
    async fn create_account(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let mut data = self.data.write().await;
        if data.accounts.values().any(|a| a.email == *email) {
            return Err(RepositoryError::Conflict(
                "email already exists".to_owned(),
            ));
        }
        let account = Account {
            id: UserId::generate(),
            email: email.clone(),
            password_hash: password_hash.to_owned(),
            created_at: Utc::now(),
        };
        data.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Account>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.accounts.values().find(|a| a.email == *email).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryDocumentStore {
    async fn put_user_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        self.data
            .write()
            .await
            .users
            .insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get_user_profile(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl EventStore for MemoryDocumentStore {
    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError> {
        let mut events = self.data.read().await.events.clone();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(events)
    }

    async fn latest_events(&self, limit: usize) -> Result<Vec<Event>, RepositoryError> {
        let mut events = self.list_events().await?;
        events.reverse();
        events.truncate(limit);
        Ok(events)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.events.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event, RepositoryError> {
        let event = event.into_event(Utc::now());
        self.data.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.events.len();
        data.events.retain(|e| e.id != id);
        Ok(data.events.len() != before)
    }
}

#[async_trait]
impl ProductStore for MemoryDocumentStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.data.read().await.products.clone();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn latest_products(&self, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.list_products().await?;
        products.truncate(limit);
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let product = product.into_product(Utc::now());
        self.data.write().await.products.push(product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.products.len();
        data.products.retain(|p| p.id != id);
        Ok(data.products.len() != before)
    }
}

#[async_trait]
impl ChatFeed for MemoryDocumentStore {
    async fn recent_chat_messages(
        &self,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let data = self.data.read().await;
        // Timestamps are taken under the write lock, so the vec is in timestamp order.
        Ok(data.chat.iter().rev().take(limit).cloned().collect())
    }

    async fn insert_chat_message(
        &self,
        message: NewChatMessage,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut data = self.data.write().await;
        let message = message.into_message(Utc::now());
        data.chat.push(message.clone());
        drop(data);
        // No receivers is fine: nobody is watching.
        let _ = self.chat_changes.send(());
        Ok(message)
    }

    async fn watch_chat(&self) -> Result<BoxStream<'static, ()>, RepositoryError> {
        Ok(change_stream(self.chat_changes.subscribe()))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
