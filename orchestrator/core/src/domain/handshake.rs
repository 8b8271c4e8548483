// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Handshake Protocol Types
//!
//! Two agents must complete a handshake before any task or context transfer.
//! A resolved handshake becomes a [`HandshakeRecord`] keyed by its
//! [`HandshakeId`]; task negotiation and state sync are only valid against a
//! recorded handshake, which is what makes handshaking mandatory rather than
//! advisory.

use crate::domain::agent::AgentId;
use crate::domain::task::TaskId;
use crate::domain::validation::{require_non_empty, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Protocol version spoken by this orchestrator.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Unique identifier assigned to an accepted handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandshakeId(Uuid);

impl HandshakeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandshakeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandshakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Request to open a handshake with a target agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub source_agent_id: AgentId,
    pub target_agent_id: AgentId,
    #[serde(default)]
    pub capabilities: HashSet<String>,
    pub protocol_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl HandshakeRequest {
    pub fn new(source: AgentId, target: AgentId, capabilities: HashSet<String>) -> Self {
        Self {
            source_agent_id: source,
            target_agent_id: target,
            capabilities,
            protocol_version: PROTOCOL_VERSION.to_string(),
            metadata: None,
        }
    }

    /// Strict schema check, run before any state mutation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("source_agent_id", self.source_agent_id.as_str())?;
        require_non_empty("target_agent_id", self.target_agent_id.as_str())?;
        require_non_empty("protocol_version", &self.protocol_version)?;
        if self.source_agent_id == self.target_agent_id {
            return Err(ValidationError::new(
                "target_agent_id",
                "source and target must differ",
            ));
        }
        Ok(())
    }
}

/// Outcome of a handshake attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handshake_id: Option<HandshakeId>,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<HashSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandshakeResponse {
    pub fn accepted(id: HandshakeId, capabilities: HashSet<String>) -> Self {
        Self {
            success: true,
            handshake_id: Some(id),
            accepted: true,
            capabilities: Some(capabilities),
            protocol_version: Some(PROTOCOL_VERSION.to_string()),
            error: None,
        }
    }

    pub fn declined(id: HandshakeId, reason: impl Into<String>) -> Self {
        Self {
            success: true,
            handshake_id: Some(id),
            accepted: false,
            capabilities: None,
            protocol_version: Some(PROTOCOL_VERSION.to_string()),
            error: Some(reason.into()),
        }
    }
}

/// Historical entry for a resolved handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeRecord {
    pub id: HandshakeId,
    pub source_agent_id: AgentId,
    pub target_agent_id: AgentId,
    pub capabilities: HashSet<String>,
    pub protocol_version: String,
    pub accepted: bool,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Result of negotiating a task over an established handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationResponse {
    pub handshake_id: HandshakeId,
    pub task_id: TaskId,
    pub accepted: bool,
    pub negotiated_at: DateTime<Utc>,
}

/// Result of syncing state over an established handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSyncResponse {
    pub handshake_id: HandshakeId,
    pub applied: bool,
    pub synced_at: DateTime<Utc>,
}

/// Errors produced by the handshake mediator.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("invalid handshake request: {0}")]
    Validation(#[from] ValidationError),

    #[error("handshaking is administratively disabled")]
    Disabled,

    #[error("handshake capacity exceeded: {in_flight} in flight (ceiling {ceiling})")]
    CapacityExceeded { in_flight: usize, ceiling: usize },

    #[error("handshake not found: {0}")]
    NotFound(HandshakeId),

    #[error("handshake rejected by {target}: {reason}")]
    Rejected { target: AgentId, reason: String },

    #[error("handshake with {target} timed out after {timeout_ms} ms")]
    TimedOut { target: AgentId, timeout_ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HandshakeRequest {
        HandshakeRequest::new(
            AgentId::new("coordinator"),
            AgentId::new("worker-1"),
            ["rust".to_string()].into(),
        )
    }

    #[test]
    fn test_valid_request_passes_validation() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_source_rejected() {
        let mut req = request();
        req.source_agent_id = AgentId::new("");
        let err = req.validate().unwrap_err();
        assert_eq!(err.field, "source_agent_id");
    }

    #[test]
    fn test_self_handshake_rejected() {
        let mut req = request();
        req.target_agent_id = req.source_agent_id.clone();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_response_serialization_skips_absent_fields() {
        let response = HandshakeResponse::accepted(HandshakeId::new(), HashSet::new());
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("handshake_id"));
    }
}
