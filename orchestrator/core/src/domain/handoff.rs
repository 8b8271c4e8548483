// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Context Handoff Types
//!
//! A handoff transports a task's structured context from source to target
//! agent as a compressed blob. Each initiated handoff produces exactly one
//! [`HandoffId`], one stored blob, and one status record transitioning
//! `Pending → Transferring → Completed | Failed`. The blob is removed
//! exactly once, on completion or cancellation, and never retained after
//! consumption.

use crate::domain::agent::AgentId;
use crate::domain::codec::{CodecError, CompressionQuality};
use crate::domain::task::{TaskId, TaskPriority};
use crate::domain::validation::{require_non_empty, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for one context handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandoffId(Uuid);

impl HandoffId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandoffId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandoffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Structured context payload carried by a handoff.
pub type ContextMap = HashMap<String, serde_json::Value>;

/// Request to transfer context from a source to a target agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextHandoffRequest {
    pub source_agent_id: AgentId,
    pub target_agent_id: AgentId,
    pub task_id: TaskId,
    pub context: ContextMap,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

impl ContextHandoffRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("source_agent_id", self.source_agent_id.as_str())?;
        require_non_empty("target_agent_id", self.target_agent_id.as_str())?;
        require_non_empty("task_id", self.task_id.as_str())?;
        Ok(())
    }
}

/// Acknowledgement returned once a handoff blob has been stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextHandoffResponse {
    pub handoff_id: HandoffId,
    pub raw_bytes: u64,
    pub compressed_bytes: u64,
}

/// Lifecycle status of a handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffStatus {
    Pending,
    Transferring,
    Completed,
    Failed,
}

/// Byte sizes and timing recorded alongside a stored blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferMetadata {
    pub raw_bytes: u64,
    pub compressed_bytes: u64,
    pub quality: CompressionQuality,
    pub compression_ms: u64,
    pub compressed_at: DateTime<Utc>,
}

/// Errors produced by the context handoff manager.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("invalid handoff request: {0}")]
    Validation(#[from] ValidationError),

    #[error("handoff not found: {0}")]
    NotFound(HandoffId),

    #[error("handoff {handoff_id} is addressed to {expected}, not {got}")]
    WrongTarget {
        handoff_id: HandoffId,
        expected: AgentId,
        got: AgentId,
    },

    #[error("context codec failed: {0}")]
    Codec(#[from] CodecError),

    #[error("context serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_request_validation() {
        let request = ContextHandoffRequest {
            source_agent_id: AgentId::new("coordinator"),
            target_agent_id: AgentId::new("worker-1"),
            task_id: TaskId::new("t1"),
            context: ContextMap::new(),
            priority: TaskPriority::High,
            deadline: None,
        };
        assert!(request.validate().is_ok());

        let mut bad = request;
        bad.task_id = TaskId::new(" ");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_status_round_trips_through_serde() {
        let json = serde_json::to_string(&HandoffStatus::Transferring).unwrap();
        assert_eq!(json, "\"transferring\"");
        let status: HandoffStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, HandoffStatus::Transferring);
    }
}
