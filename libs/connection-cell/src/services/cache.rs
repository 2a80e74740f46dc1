use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

#[derive(Default)]
struct CacheInner {
    by_user: HashMap<String, String>,
    by_connection: HashMap<String, String>,
    order: VecDeque<String>,
}

/// Process-local, best-effort mirror of the connection directory.
///
/// Never authoritative: a miss here must be followed by a directory read
/// before a user is declared not connected. Entries live until they are
/// invalidated by a disconnect or a stale delivery, or evicted
/// oldest-first once the capacity bound is reached.
pub struct IdentityCache {
    inner: RwLock<CacheInner>,
    max_entries: usize,
}

impl IdentityCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            max_entries: max_entries.max(1),
        }
    }

    pub async fn insert(&self, user_id: &str, connection_id: &str) {
        let mut inner = self.inner.write().await;

        // Drop any previous mapping on either side before linking the pair.
        if let Some(old_connection) = inner.by_user.remove(user_id) {
            inner.by_connection.remove(&old_connection);
        }
        if let Some(old_user) = inner.by_connection.remove(connection_id) {
            inner.by_user.remove(&old_user);
            inner.order.retain(|u| u != &old_user);
        }
        inner.order.retain(|u| u != user_id);

        inner
            .by_user
            .insert(user_id.to_string(), connection_id.to_string());
        inner
            .by_connection
            .insert(connection_id.to_string(), user_id.to_string());
        inner.order.push_back(user_id.to_string());

        while inner.by_user.len() > self.max_entries {
            match inner.order.pop_front() {
                Some(oldest) => {
                    debug!("Identity cache at capacity, evicting {}", oldest);
                    if let Some(connection) = inner.by_user.remove(&oldest) {
                        inner.by_connection.remove(&connection);
                    }
                }
                None => break,
            }
        }
    }

    pub async fn connection_for(&self, user_id: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner.by_user.get(user_id).cloned()
    }

    pub async fn user_for(&self, connection_id: &str) -> Option<String> {
        let inner = self.inner.read().await;
        inner.by_connection.get(connection_id).cloned()
    }

    pub async fn remove_user(&self, user_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(connection) = inner.by_user.remove(user_id) {
            inner.by_connection.remove(&connection);
        }
        inner.order.retain(|u| u != user_id);
    }

    pub async fn remove_connection(&self, connection_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.by_connection.remove(connection_id) {
            inner.by_user.remove(&user);
            inner.order.retain(|u| u != &user);
        }
    }

    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.by_user.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
