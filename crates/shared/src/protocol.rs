use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Method, OperationMode};

/// Body of `POST /process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
    pub method: Method,
    pub password: String,
    pub action: OperationMode,
}

/// Raw reply of `POST /process`. The service reports failures in-band via
/// `success: false` plus an `error` message, so most fields are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<OperationMode>,
    #[serde(default)]
    pub input_length: u64,
    #[serde(default)]
    pub output_length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A successful transformation after gateway normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub result: String,
    pub method: Method,
    pub action: OperationMode,
    pub input_length: u64,
    pub output_length: u64,
}

/// Reply of `GET /generate-key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedKey {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub strength: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate counters from `GET /stats` once at least one operation exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_operations: u64,
    pub total_characters: u64,
    pub average_length: f64,
    pub success_rate: f64,
    #[serde(default)]
    pub methods_used: HashMap<String, u64>,
    pub uptime: String,
    pub most_used: String,
}

/// `GET /stats` returns either the aggregate snapshot or a plain message
/// while no history exists yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatsReply {
    Data(StatsSnapshot),
    Empty { message: String },
}

/// Reply of `POST /clear-history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearHistoryReply {
    pub message: String,
}
