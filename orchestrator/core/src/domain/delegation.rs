// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::agent::AgentId;
use crate::domain::handoff::HandoffError;
use crate::domain::handshake::HandshakeError;
use crate::domain::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where a candidate delegate came from, in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationSource {
    FastPath,
    Programmatic,
    Local,
    Consensus,
}

impl fmt::Display for DelegationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FastPath => "fast-path",
            Self::Programmatic => "programmatic",
            Self::Local => "local",
            Self::Consensus => "consensus",
        };
        f.write_str(name)
    }
}

/// End-to-end timing for one delegation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationMetrics {
    pub duration_ms: u64,
    pub latency_within_target: bool,
}

/// Terminal, caller-visible record of one delegation attempt.
///
/// `delegate_task` always returns one of these; it never surfaces a raw
/// error to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationResult {
    pub success: bool,
    pub task_id: TaskId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegated_to: Option<AgentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metrics: DelegationMetrics,
}

/// Failure of one delegation source, consumed only by the orchestrator's
/// source-iteration loop. Never bubbles to the caller as an exception.
#[derive(Debug, Error)]
pub(crate) enum SourceError {
    #[error("handshake with {agent} failed: {source}")]
    Handshake {
        agent: AgentId,
        source: HandshakeError,
    },

    #[error("handoff to {agent} failed: {source}")]
    Handoff {
        agent: AgentId,
        source: HandoffError,
    },

    #[error("inference for {agent} failed: {reason}")]
    Invocation { agent: AgentId, reason: String },

    #[error("no consensus reached: {0}")]
    NoConsensus(String),

    #[error("no candidate agent for this source")]
    NoCandidate,
}
