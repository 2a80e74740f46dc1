// libs/connection-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ==============================================================================
// CONNECTION DIRECTORY MODELS
// ==============================================================================

/// A persisted connection-identity association in the "connections"
/// collection. At most one non-disconnected record exists per user at a
/// time; resolution always takes the most recently registered connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub connection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: ConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Fields merged into a directory record on upsert. Absent fields are
/// left untouched in the stored document.
#[derive(Debug, Clone, Default)]
pub struct ConnectionUpdate {
    pub user_id: Option<String>,
    pub status: Option<ConnectionStatus>,
    pub connected_at: Option<DateTime<Utc>>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

// ==============================================================================
// INBOUND FRAME MODELS
// ==============================================================================

/// An inbound WebSocket frame as relayed by the hosting gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub action: String,
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrScanData {
    pub doctor_id: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    pub qr_code: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponseData {
    pub doctor_id: String,
    pub patient_id: String,
    pub response: String,
}

// ==============================================================================
// OUTCOME MODELS
// ==============================================================================

/// Structured outcome of a routed frame. Every action handler returns one
/// of these, success or failure; a bare string never reaches the caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrameResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameResponse {
    pub fn ok(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            message: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}
