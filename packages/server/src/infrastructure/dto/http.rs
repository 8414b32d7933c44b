//! HTTP API DTOs for the notification fan-out layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::EventKind;

/// Registry snapshot for the debug endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshotDto {
    pub connections: usize,
    pub channels: Vec<ChannelSummaryDto>,
}

/// One non-empty channel in the registry snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummaryDto {
    pub name: String,
    pub members: usize,
}

/// Emission request from the REST layer, sent after a successful commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitRequestDto {
    pub r#type: EventKind,
    pub context: EmitContextDto,
    #[serde(default)]
    pub payload: Value,
}

/// Who was involved in the write (numeric portal ids)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitContextDto {
    pub actor: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort: Option<u64>,
}

/// Delivery outcome of one emission (best-effort, informational only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitResponseDto {
    /// Live connections resolved from the target channels
    pub resolved: usize,
    /// Deliveries handed to a transport successfully
    pub delivered: usize,
    /// Deliveries dropped because a transport was gone
    pub failed: usize,
}
