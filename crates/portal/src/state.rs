//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::db::{DocumentStore, MemoryDocumentStore};
use crate::services::{ChatService, RoleCache};
use crate::storage::{MemoryObjectStorage, ObjectStorage};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend, object storage, role cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn ObjectStorage>,
    roles: RoleCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Portal configuration
    /// * `store` - Document and account backend
    /// * `storage` - Object storage for uploaded images
    #[must_use]
    pub fn new(
        config: PortalConfig,
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                storage,
                roles: RoleCache::new(),
            }),
        }
    }

    /// State over a fresh in-memory backend and object storage.
    #[must_use]
    pub fn in_memory(config: PortalConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryObjectStorage::new()),
        )
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the backend.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to object storage.
    #[must_use]
    pub fn storage(&self) -> &dyn ObjectStorage {
        self.inner.storage.as_ref()
    }

    /// Get a reference to the role cache.
    #[must_use]
    pub fn roles(&self) -> &RoleCache {
        &self.inner.roles
    }

    /// Chat service over this state's backend.
    #[must_use]
    pub fn chat(&self) -> ChatService {
        ChatService::new(
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.storage),
            self.inner.config.chat_history,
        )
    }
}
