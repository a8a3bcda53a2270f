//! Role resolution with caching.
//!
//! Role documents are written once at registration and never change, so a
//! resolved role can be cached for the life of the process.

use std::time::Duration;

use moka::future::Cache;

use nagar_core::{Role, UserId};

use crate::db::UserStore;

/// Maximum number of cached roles.
const ROLE_CACHE_CAPACITY: u64 = 10_000;

/// Cached roles are dropped after this much idle time.
const ROLE_CACHE_IDLE: Duration = Duration::from_secs(60 * 60);

/// Cache of resolved roles keyed by account.
#[derive(Clone)]
pub struct RoleCache {
    cache: Cache<UserId, Role>,
}

impl RoleCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(ROLE_CACHE_CAPACITY)
                .time_to_idle(ROLE_CACHE_IDLE)
                .build(),
        }
    }

    /// Resolve the role of `user_id`.
    ///
    /// A missing role document or a failed lookup resolves to
    /// [`Role::Guest`] and is not cached, so a later request retries.
    pub async fn resolve<U>(&self, users: &U, user_id: UserId) -> Role
    where
        U: UserStore + ?Sized,
    {
        if let Some(role) = self.cache.get(&user_id).await {
            return role;
        }

        match users.get_user_profile(user_id).await {
            Ok(Some(profile)) => {
                let role = profile.role();
                self.cache.insert(user_id, role).await;
                role
            }
            Ok(None) => {
                tracing::warn!(%user_id, "No role document for signed-in user");
                Role::Guest
            }
            Err(e) => {
                tracing::error!(%user_id, error = %e, "Failed to fetch role document");
                Role::Guest
            }
        }
    }

    /// Record the role of a freshly registered account.
    pub async fn prime(&self, user_id: UserId, role: Role) {
        self.cache.insert(user_id, role).await;
    }
}

impl Default for RoleCache {
    fn default() -> Self {
        Self::new()
    }
}
