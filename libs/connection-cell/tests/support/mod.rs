#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use connection_cell::error::ConnectionError;
use connection_cell::models::{ConnectionRecord, ConnectionStatus, ConnectionUpdate};
use connection_cell::services::cache::IdentityCache;
use connection_cell::services::directory::ConnectionDirectory;
use connection_cell::services::gateway::{DeliveryError, DeliveryGateway};
use connection_cell::services::lifecycle::ConnectionLifecycleService;
use connection_cell::services::router::MessageRouter;

/// In-memory stand-in for the persisted connection directory.
#[derive(Default)]
pub struct InMemoryDirectory {
    pub records: Mutex<HashMap<String, ConnectionRecord>>,
    pub patient_doctors: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn record(&self, connection_id: &str) -> Option<ConnectionRecord> {
        self.records.lock().unwrap().get(connection_id).cloned()
    }

    pub fn seed_record(&self, record: ConnectionRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.connection_id.clone(), record);
    }

    pub fn doctor_for(&self, patient_id: &str) -> Option<String> {
        self.patient_doctors.lock().unwrap().get(patient_id).cloned()
    }

    fn check_available(&self) -> Result<(), ConnectionError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ConnectionError::StoreUnavailable("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConnectionDirectory for InMemoryDirectory {
    async fn upsert_connection(
        &self,
        connection_id: &str,
        fields: ConnectionUpdate,
    ) -> Result<(), ConnectionError> {
        self.check_available()?;

        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(connection_id.to_string())
            .or_insert_with(|| ConnectionRecord {
                connection_id: connection_id.to_string(),
                user_id: None,
                status: ConnectionStatus::Connected,
                connected_at: None,
                disconnected_at: None,
            });

        if let Some(user_id) = fields.user_id {
            record.user_id = Some(user_id);
        }
        if let Some(status) = fields.status {
            record.status = status;
        }
        if let Some(at) = fields.connected_at {
            record.connected_at = Some(at);
        }
        if let Some(at) = fields.disconnected_at {
            record.disconnected_at = Some(at);
        }

        Ok(())
    }

    async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<ConnectionRecord>, ConnectionError> {
        self.check_available()?;

        let records = self.records.lock().unwrap();
        let mut matches: Vec<&ConnectionRecord> = records
            .values()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .collect();
        matches.sort_by_key(|r| r.connected_at);

        Ok(matches.last().map(|r| (*r).clone()))
    }

    async fn find_by_connection_id(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionRecord>, ConnectionError> {
        self.check_available()?;

        Ok(self.records.lock().unwrap().get(connection_id).cloned())
    }

    async fn mark_disconnected(&self, connection_id: &str) -> Result<(), ConnectionError> {
        self.check_available()?;

        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(connection_id) {
            record.status = ConnectionStatus::Disconnected;
            record.disconnected_at = Some(chrono::Utc::now());
        }

        Ok(())
    }

    async fn remove(&self, connection_id: &str) -> Result<(), ConnectionError> {
        self.check_available()?;

        self.records.lock().unwrap().remove(connection_id);
        Ok(())
    }

    async fn associate_doctor(
        &self,
        patient_id: &str,
        doctor_id: &str,
    ) -> Result<(), ConnectionError> {
        self.check_available()?;

        self.patient_doctors
            .lock()
            .unwrap()
            .insert(patient_id.to_string(), doctor_id.to_string());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub enum DeliveryBehavior {
    Succeed,
    Stale,
    Fail,
}

/// Records every delivery attempt and answers with a programmable
/// per-connection outcome.
#[derive(Default)]
pub struct RecordingGateway {
    pub attempts: Mutex<Vec<(String, Value)>>,
    behaviors: Mutex<HashMap<String, DeliveryBehavior>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behavior(&self, connection_id: &str, behavior: DeliveryBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(connection_id.to_string(), behavior);
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn attempts_for(&self, connection_id: &str) -> Vec<Value> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == connection_id)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[async_trait]
impl DeliveryGateway for RecordingGateway {
    async fn post_to_connection(
        &self,
        connection_id: &str,
        payload: Value,
    ) -> Result<(), DeliveryError> {
        self.attempts
            .lock()
            .unwrap()
            .push((connection_id.to_string(), payload));

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(connection_id)
            .copied()
            .unwrap_or(DeliveryBehavior::Succeed);

        match behavior {
            DeliveryBehavior::Succeed => Ok(()),
            DeliveryBehavior::Stale => Err(DeliveryError::Stale(connection_id.to_string())),
            DeliveryBehavior::Fail => Err(DeliveryError::Transport(
                connection_id.to_string(),
                "connection reset".to_string(),
            )),
        }
    }
}

pub struct TestCell {
    pub directory: Arc<InMemoryDirectory>,
    pub gateway: Arc<RecordingGateway>,
    pub cache: Arc<IdentityCache>,
    pub router: MessageRouter,
    pub lifecycle: ConnectionLifecycleService,
}

pub fn build_cell() -> TestCell {
    build_cell_with_capacity(connection_cell::services::cache::DEFAULT_CACHE_CAPACITY)
}

pub fn build_cell_with_capacity(capacity: usize) -> TestCell {
    let directory = Arc::new(InMemoryDirectory::new());
    let gateway = Arc::new(RecordingGateway::new());
    let cache = Arc::new(IdentityCache::new(capacity));

    let directory_dyn: Arc<dyn ConnectionDirectory> = directory.clone();
    let gateway_dyn: Arc<dyn DeliveryGateway> = gateway.clone();

    let router = MessageRouter::new(directory_dyn.clone(), cache.clone(), gateway_dyn);
    let lifecycle = ConnectionLifecycleService::new(directory_dyn, cache.clone());

    TestCell {
        directory,
        gateway,
        cache,
        router,
        lifecycle,
    }
}
