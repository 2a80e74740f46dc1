use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::DocumentStoreClient;

use crate::error::ConnectionError;
use crate::models::{ConnectionRecord, ConnectionUpdate};

/// Persisted mapping from logical user identity to live transport
/// connection. Survives process restarts; the identity cache is
/// reconciled from it on every miss.
#[async_trait]
pub trait ConnectionDirectory: Send + Sync {
    /// Insert-or-update keyed by connection id, merging `fields` into the
    /// existing record. Idempotent.
    async fn upsert_connection(
        &self,
        connection_id: &str,
        fields: ConnectionUpdate,
    ) -> Result<(), ConnectionError>;

    /// Most recently registered record for the user, or none.
    async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<ConnectionRecord>, ConnectionError>;

    async fn find_by_connection_id(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionRecord>, ConnectionError>;

    /// Sets status=disconnected and stamps the time; the record is kept
    /// for audit.
    async fn mark_disconnected(&self, connection_id: &str) -> Result<(), ConnectionError>;

    /// Hard delete. Only used for stale-connection cleanup.
    async fn remove(&self, connection_id: &str) -> Result<(), ConnectionError>;

    /// Persist the patient-doctor association produced by an accepted
    /// connection response.
    async fn associate_doctor(
        &self,
        patient_id: &str,
        doctor_id: &str,
    ) -> Result<(), ConnectionError>;
}

pub struct DocumentConnectionDirectory {
    store: Arc<DocumentStoreClient>,
}

impl DocumentConnectionDirectory {
    pub fn new(store: Arc<DocumentStoreClient>) -> Self {
        Self { store }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );
        headers
    }
}

#[async_trait]
impl ConnectionDirectory for DocumentConnectionDirectory {
    async fn upsert_connection(
        &self,
        connection_id: &str,
        fields: ConnectionUpdate,
    ) -> Result<(), ConnectionError> {
        let mut body = json!({ "connectionId": connection_id });
        if let Some(user_id) = &fields.user_id {
            body["userId"] = json!(user_id);
        }
        if let Some(status) = &fields.status {
            body["status"] = json!(status.to_string());
        }
        if let Some(at) = &fields.connected_at {
            body["connectedAt"] = json!(at.to_rfc3339());
        }
        if let Some(at) = &fields.disconnected_at {
            body["disconnectedAt"] = json!(at.to_rfc3339());
        }

        let _: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/connections?on_conflict=connectionId",
                Some(body),
                Some(Self::representation_headers()),
            )
            .await?;

        debug!("Upserted connection record {}", connection_id);
        Ok(())
    }

    async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> Result<Option<ConnectionRecord>, ConnectionError> {
        let path = format!(
            "/rest/v1/connections?userId=eq.{}&order=connectedAt.desc&limit=1",
            user_id
        );
        let result: Vec<ConnectionRecord> = self.store.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    async fn find_by_connection_id(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionRecord>, ConnectionError> {
        let path = format!("/rest/v1/connections?connectionId=eq.{}&limit=1", connection_id);
        let result: Vec<ConnectionRecord> = self.store.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }

    async fn mark_disconnected(&self, connection_id: &str) -> Result<(), ConnectionError> {
        let path = format!("/rest/v1/connections?connectionId=eq.{}", connection_id);
        let body = json!({
            "status": "disconnected",
            "disconnectedAt": Utc::now().to_rfc3339(),
        });

        let _: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(Self::representation_headers()),
            )
            .await?;

        Ok(())
    }

    async fn remove(&self, connection_id: &str) -> Result<(), ConnectionError> {
        let path = format!("/rest/v1/connections?connectionId=eq.{}", connection_id);

        let _: Vec<Value> = self
            .store
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(Self::representation_headers()),
            )
            .await?;

        debug!("Removed stale connection record {}", connection_id);
        Ok(())
    }

    async fn associate_doctor(
        &self,
        patient_id: &str,
        doctor_id: &str,
    ) -> Result<(), ConnectionError> {
        let path = format!("/rest/v1/patients?patientId=eq.{}", patient_id);
        let body = json!({
            "doctorId": doctor_id,
            "updatedAt": Utc::now().to_rfc3339(),
        });

        let _: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(Self::representation_headers()),
            )
            .await?;

        Ok(())
    }
}
