// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::agent::AgentId;
use crate::domain::delegation::DelegationSource;
use crate::domain::handoff::HandoffId;
use crate::domain::handshake::HandshakeId;
use crate::domain::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handshake lifecycle notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HandshakeEvent {
    Requested {
        handshake_id: HandshakeId,
        source_agent_id: AgentId,
        target_agent_id: AgentId,
        requested_at: DateTime<Utc>,
    },
    Completed {
        handshake_id: HandshakeId,
        target_agent_id: AgentId,
        accepted: bool,
        completed_at: DateTime<Utc>,
    },
}

/// Context handoff lifecycle notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HandoffEvent {
    Initiated {
        handoff_id: HandoffId,
        task_id: TaskId,
        source_agent_id: AgentId,
        target_agent_id: AgentId,
        raw_bytes: u64,
        compressed_bytes: u64,
        initiated_at: DateTime<Utc>,
    },
    Completed {
        handoff_id: HandoffId,
        target_agent_id: AgentId,
        completed_at: DateTime<Utc>,
    },
    Failed {
        handoff_id: HandoffId,
        reason: String,
        failed_at: DateTime<Utc>,
    },
    Cancelled {
        handoff_id: HandoffId,
        cancelled_at: DateTime<Utc>,
    },
}

/// Backend invocation notifications from the fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InferenceEvent {
    AttemptFailed {
        backend: String,
        attempt: u32,
        reason: String,
        elapsed_ms: u64,
        failed_at: DateTime<Utc>,
    },
    /// Emitted when the chain moves away from the originally preferred
    /// backend.
    FellBack {
        from_backend: String,
        to_backend: String,
        fell_back_at: DateTime<Utc>,
    },
    LatencyTargetExceeded {
        elapsed_ms: u64,
        target_ms: u64,
        exceeded_at: DateTime<Utc>,
    },
}

/// Delegation lifecycle notifications from the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DelegationEvent {
    Started {
        task_id: TaskId,
        started_at: DateTime<Utc>,
    },
    SourceFailed {
        task_id: TaskId,
        source: DelegationSource,
        reason: String,
        failed_at: DateTime<Utc>,
    },
    Completed {
        task_id: TaskId,
        agent_id: AgentId,
        source: DelegationSource,
        duration_ms: u64,
        completed_at: DateTime<Utc>,
    },
    Failed {
        task_id: TaskId,
        reason: String,
        duration_ms: u64,
        failed_at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_round_trip_through_serde() {
        let event = DelegationEvent::Completed {
            task_id: TaskId::new("t1"),
            agent_id: AgentId::new("a1"),
            source: DelegationSource::FastPath,
            duration_ms: 42,
            completed_at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: DelegationEvent = serde_json::from_str(&json).unwrap();
        match back {
            DelegationEvent::Completed { duration_ms, .. } => assert_eq!(duration_ms, 42),
            _ => panic!("wrong variant"),
        }
    }
}
