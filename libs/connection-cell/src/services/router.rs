use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::models::{
    ConnectionResponseData, ConnectionStatus, ConnectionUpdate, FrameResponse, InboundFrame,
    QrScanData, RegisterData,
};
use crate::services::cache::IdentityCache;
use crate::services::directory::ConnectionDirectory;
use crate::services::gateway::{DeliveryError, DeliveryGateway};

/// Dispatches inbound WebSocket frames to the fixed set of action
/// handlers. Identity resolution is two-tier: the process-local cache is
/// the fast path, the persisted directory the fallback, so routing keeps
/// functioning with reduced guarantees while the store is down.
pub struct MessageRouter {
    directory: Arc<dyn ConnectionDirectory>,
    cache: Arc<IdentityCache>,
    gateway: Arc<dyn DeliveryGateway>,
}

impl MessageRouter {
    pub fn new(
        directory: Arc<dyn ConnectionDirectory>,
        cache: Arc<IdentityCache>,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> Self {
        Self {
            directory,
            cache,
            gateway,
        }
    }

    pub async fn handle_frame(&self, connection_id: &str, raw: &str) -> FrameResponse {
        let frame: InboundFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Rejecting malformed frame from {}: {}", connection_id, e);
                return FrameResponse::error(400, format!("malformed frame: {}", e));
            }
        };

        if frame.action.trim().is_empty() {
            return FrameResponse::error(400, "action is required");
        }

        match frame.action.as_str() {
            "register" => self.handle_register(connection_id, frame.data).await,
            "qr_scan" => self.handle_qr_scan(frame.data).await,
            "connection_response" => self.handle_connection_response(frame.data).await,
            other => FrameResponse::error(400, format!("unknown action: {}", other)),
        }
    }

    async fn handle_register(&self, connection_id: &str, data: Value) -> FrameResponse {
        let data: RegisterData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(_) => return FrameResponse::error(400, "userId is required"),
        };
        if data.user_id.trim().is_empty() {
            return FrameResponse::error(400, "userId is required");
        }
        let user_id = data.user_id;

        self.cache.insert(&user_id, connection_id).await;

        let update = ConnectionUpdate {
            user_id: Some(user_id.clone()),
            status: Some(ConnectionStatus::Connected),
            connected_at: Some(Utc::now()),
            disconnected_at: None,
        };
        if let Err(e) = self.directory.upsert_connection(connection_id, update).await {
            warn!(
                "Directory unavailable while registering {}: {}; continuing with cache only",
                user_id, e
            );
        }

        let confirmation = json!({
            "type": "registration_response",
            "status": "registered",
            "message": "User registered successfully",
            "userId": user_id,
            "timestamp": Utc::now().to_rfc3339(),
        });

        match self.gateway.post_to_connection(connection_id, confirmation).await {
            Ok(()) => {
                info!("User {} registered with connection {}", user_id, connection_id);
                FrameResponse::ok(200, "User registered successfully")
            }
            Err(DeliveryError::Stale(_)) => {
                // The registration is void if its own confirmation cannot
                // be delivered; this is a logged anomaly, not retried.
                warn!(
                    "Registration confirmation for {} hit stale connection {}",
                    user_id, connection_id
                );
                self.purge_identity(&user_id, connection_id).await;
                FrameResponse::error(404, "connection is no longer live")
            }
            Err(DeliveryError::Transport(_, reason)) => {
                error!(
                    "Failed to deliver registration confirmation to {}: {}",
                    connection_id, reason
                );
                FrameResponse::error(502, "failed to deliver registration confirmation")
            }
        }
    }

    async fn handle_qr_scan(&self, data: Value) -> FrameResponse {
        let data: QrScanData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(_) => return FrameResponse::error(400, "doctorId and qrCode are required"),
        };
        if data.doctor_id.trim().is_empty() {
            return FrameResponse::error(400, "doctorId is required");
        }

        let patient_id = match parse_qr_patient_id(&data.qr_code) {
            Some(patient_id) => patient_id,
            None => return FrameResponse::error(400, "qrCode does not contain a patientId"),
        };

        let patient_connection = match self.resolve_connection(&patient_id).await {
            Some(connection_id) => connection_id,
            None => return FrameResponse::error(404, "Patient not connected"),
        };

        let mut notification = json!({
            "type": "doctor_request",
            "doctorId": data.doctor_id,
        });
        if let Some(name) = &data.doctor_name {
            notification["doctorName"] = json!(name);
        }
        if let Some(specialization) = &data.specialization {
            notification["specialization"] = json!(specialization);
        }

        match self
            .gateway
            .post_to_connection(&patient_connection, notification)
            .await
        {
            Ok(()) => {
                info!(
                    "Doctor {} request delivered to patient {}",
                    data.doctor_id, patient_id
                );
                FrameResponse::ok(200, "Appointment request sent")
            }
            Err(DeliveryError::Stale(_)) => {
                warn!(
                    "Doctor request for patient {} hit stale connection {}",
                    patient_id, patient_connection
                );
                self.purge_identity(&patient_id, &patient_connection).await;
                FrameResponse::error(404, "Patient not connected")
            }
            Err(DeliveryError::Transport(_, reason)) => {
                error!(
                    "Failed to deliver doctor request to patient {}: {}",
                    patient_id, reason
                );
                FrameResponse::error(502, "failed to deliver doctor request")
            }
        }
    }

    async fn handle_connection_response(&self, data: Value) -> FrameResponse {
        let data: ConnectionResponseData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(_) => {
                return FrameResponse::error(400, "doctorId, patientId and response are required")
            }
        };
        if data.doctor_id.trim().is_empty()
            || data.patient_id.trim().is_empty()
            || data.response.trim().is_empty()
        {
            return FrameResponse::error(400, "doctorId, patientId and response are required");
        }

        let accepted = data.response == "accepted";

        // Persist the association before attempting delivery; the
        // notification is allowed to fail.
        if accepted {
            match self
                .directory
                .associate_doctor(&data.patient_id, &data.doctor_id)
                .await
            {
                Ok(()) => info!(
                    "Patient {} is now associated with doctor {}",
                    data.patient_id, data.doctor_id
                ),
                Err(e) => error!(
                    "Failed to associate patient {} with doctor {}: {}",
                    data.patient_id, data.doctor_id, e
                ),
            }
        }

        let doctor_connection = match self.resolve_connection(&data.doctor_id).await {
            Some(connection_id) => connection_id,
            None => return FrameResponse::error(404, "Doctor not connected"),
        };

        let notification = json!({
            "type": "patient_response",
            "accepted": accepted,
            "patientId": data.patient_id,
        });

        match self
            .gateway
            .post_to_connection(&doctor_connection, notification)
            .await
        {
            Ok(()) => FrameResponse::ok(200, "Response sent"),
            Err(DeliveryError::Stale(_)) => {
                warn!(
                    "Patient response for doctor {} hit stale connection {}",
                    data.doctor_id, doctor_connection
                );
                self.purge_identity(&data.doctor_id, &doctor_connection).await;
                FrameResponse::error(404, "Doctor not connected")
            }
            Err(DeliveryError::Transport(_, reason)) => {
                error!(
                    "Failed to deliver patient response to doctor {}: {}",
                    data.doctor_id, reason
                );
                FrameResponse::error(502, "failed to deliver patient response")
            }
        }
    }

    /// Cache fast path, directory fallback. A directory hit repopulates
    /// the cache; a directory failure degrades to "not connected" rather
    /// than aborting the frame.
    async fn resolve_connection(&self, user_id: &str) -> Option<String> {
        if let Some(connection_id) = self.cache.connection_for(user_id).await {
            debug!("Resolved {} from identity cache", user_id);
            return Some(connection_id);
        }

        match self.directory.find_by_user_id(user_id).await {
            Ok(Some(record)) if record.status == ConnectionStatus::Connected => {
                self.cache.insert(user_id, &record.connection_id).await;
                Some(record.connection_id)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(
                    "Directory lookup for {} failed: {}; treating as not connected",
                    user_id, e
                );
                None
            }
        }
    }

    async fn purge_identity(&self, user_id: &str, connection_id: &str) {
        self.cache.remove_user(user_id).await;
        self.cache.remove_connection(connection_id).await;
        if let Err(e) = self.directory.remove(connection_id).await {
            warn!(
                "Failed to remove stale connection {} from directory: {}",
                connection_id, e
            );
        }
    }
}

/// The scanned QR payload is structured data carrying the patient
/// identity; it arrives either as an object or as a string of JSON.
fn parse_qr_patient_id(qr_code: &Value) -> Option<String> {
    let decoded;
    let payload = match qr_code {
        Value::String(raw) => {
            decoded = serde_json::from_str::<Value>(raw).ok()?;
            &decoded
        }
        other => other,
    };

    payload
        .get("patientId")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_qr_patient_id;
    use serde_json::json;

    #[test]
    fn parses_patient_id_from_object() {
        let qr = json!({ "patientId": "PAT-123456" });
        assert_eq!(parse_qr_patient_id(&qr).as_deref(), Some("PAT-123456"));
    }

    #[test]
    fn parses_patient_id_from_embedded_json_string() {
        let qr = json!("{\"patientId\":\"PAT-123456\"}");
        assert_eq!(parse_qr_patient_id(&qr).as_deref(), Some("PAT-123456"));
    }

    #[test]
    fn rejects_payload_without_patient_id() {
        assert_eq!(parse_qr_patient_id(&json!({ "foo": "bar" })), None);
        assert_eq!(parse_qr_patient_id(&json!("not json")), None);
        assert_eq!(parse_qr_patient_id(&json!({ "patientId": "" })), None);
    }
}
