use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::ConnectionError;
use crate::models::{ConnectionStatus, ConnectionUpdate};
use crate::services::cache::IdentityCache;
use crate::services::directory::ConnectionDirectory;

/// Handles transport-level connect/disconnect events from the hosting
/// gateway.
pub struct ConnectionLifecycleService {
    directory: Arc<dyn ConnectionDirectory>,
    cache: Arc<IdentityCache>,
}

impl ConnectionLifecycleService {
    pub fn new(directory: Arc<dyn ConnectionDirectory>, cache: Arc<IdentityCache>) -> Self {
        Self { directory, cache }
    }

    /// Persistence failure here is fatal to the operation: without a
    /// directory row, later identity resolution is impossible.
    pub async fn on_connect(&self, connection_id: &str) -> Result<(), ConnectionError> {
        let update = ConnectionUpdate {
            status: Some(ConnectionStatus::Connected),
            connected_at: Some(Utc::now()),
            ..Default::default()
        };
        self.directory.upsert_connection(connection_id, update).await?;

        info!("WebSocket connected: {}", connection_id);
        Ok(())
    }

    pub async fn on_disconnect(&self, connection_id: &str) -> Result<(), ConnectionError> {
        // Identity correlation is best-effort; the disconnect proceeds
        // even when the record cannot be read.
        match self.directory.find_by_connection_id(connection_id).await {
            Ok(Some(record)) => {
                if let Some(user_id) = &record.user_id {
                    info!("Disconnecting user: {}", user_id);
                    self.cache.remove_user(user_id).await;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Could not correlate disconnect {} with an identity: {}",
                connection_id, e
            ),
        }

        self.cache.remove_connection(connection_id).await;

        self.directory.mark_disconnected(connection_id).await?;

        info!("WebSocket disconnected: {}", connection_id);
        Ok(())
    }
}
