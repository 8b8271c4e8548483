// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Handshake Mediator
//!
//! Runs the two-party agreement protocol that must precede any task or
//! context transfer. Tracks in-flight handshakes against a hard ceiling
//! (backpressure by rejection, never queueing) and keeps the history that
//! task negotiation and state sync are validated against.

use crate::domain::agent::AgentId;
use crate::domain::config::OrchestratorConfig;
use crate::domain::events::HandshakeEvent;
use crate::domain::handshake::{
    HandshakeError, HandshakeId, HandshakeRecord, HandshakeRequest, HandshakeResponse,
    NegotiationResponse, StateSyncResponse,
};
use crate::domain::task::Task;
use crate::infrastructure::event_bus::EventBus;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct HandshakeMediator {
    config: Arc<RwLock<OrchestratorConfig>>,
    history: DashMap<HandshakeId, HandshakeRecord>,
    in_flight: DashMap<HandshakeId, Instant>,
    /// Capabilities learned from accepted handshakes, by target agent.
    capabilities: DashMap<AgentId, HashSet<String>>,
    bus: EventBus,
}

impl HandshakeMediator {
    pub fn new(config: Arc<RwLock<OrchestratorConfig>>, bus: EventBus) -> Self {
        Self {
            config,
            history: DashMap::new(),
            in_flight: DashMap::new(),
            capabilities: DashMap::new(),
            bus,
        }
    }

    /// Open a handshake with a target agent.
    ///
    /// Validates the request, refuses when handshaking is disabled or the
    /// in-flight ceiling is reached, then synthesizes the target's
    /// acceptance. In this protocol revision the target always accepts; the
    /// `accepted` flag on the response is the hook for a future negotiation
    /// policy.
    pub async fn initiate_handshake(
        &self,
        request: HandshakeRequest,
    ) -> Result<HandshakeResponse, HandshakeError> {
        request.validate()?;

        let (enabled, ceiling, timeout_ms) = {
            let config = self.config.read();
            (
                config.handshake.enabled,
                config.handshake.max_inflight,
                config.handshake.timeout_ms,
            )
        };

        if !enabled {
            warn!(
                source = %request.source_agent_id,
                target = %request.target_agent_id,
                "handshake refused: handshaking is disabled"
            );
            return Err(HandshakeError::Disabled);
        }

        let in_flight = self.in_flight.len();
        if in_flight >= ceiling {
            warn!(in_flight, ceiling, "handshake refused: capacity exceeded");
            return Err(HandshakeError::CapacityExceeded { in_flight, ceiling });
        }

        let handshake_id = HandshakeId::new();
        let initiated_at = Utc::now();
        self.in_flight.insert(handshake_id, Instant::now());

        self.bus.publish_handshake_event(HandshakeEvent::Requested {
            handshake_id,
            source_agent_id: request.source_agent_id.clone(),
            target_agent_id: request.target_agent_id.clone(),
            requested_at: initiated_at,
        });

        let accepted = match tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            self.resolve_target(&request),
        )
        .await
        {
            Ok(accepted) => accepted,
            Err(_) => {
                self.in_flight.remove(&handshake_id);
                warn!(%handshake_id, timeout_ms, "handshake round-trip timed out");
                return Err(HandshakeError::TimedOut {
                    target: request.target_agent_id,
                    timeout_ms,
                });
            }
        };

        if accepted {
            self.capabilities
                .insert(request.target_agent_id.clone(), request.capabilities.clone());
        }

        let record = HandshakeRecord {
            id: handshake_id,
            source_agent_id: request.source_agent_id.clone(),
            target_agent_id: request.target_agent_id.clone(),
            capabilities: request.capabilities.clone(),
            protocol_version: request.protocol_version.clone(),
            accepted,
            initiated_at,
            completed_at: Utc::now(),
        };
        self.history.insert(handshake_id, record);
        self.in_flight.remove(&handshake_id);

        self.bus.publish_handshake_event(HandshakeEvent::Completed {
            handshake_id,
            target_agent_id: request.target_agent_id.clone(),
            accepted,
            completed_at: Utc::now(),
        });

        info!(
            %handshake_id,
            source = %request.source_agent_id,
            target = %request.target_agent_id,
            accepted,
            "handshake completed"
        );

        if accepted {
            Ok(HandshakeResponse::accepted(handshake_id, request.capabilities))
        } else {
            Ok(HandshakeResponse::declined(handshake_id, "target declined"))
        }
    }

    /// Target side of the round-trip. The target always accepts in this
    /// protocol revision; a real negotiation policy slots in here.
    async fn resolve_target(&self, _request: &HandshakeRequest) -> bool {
        tokio::task::yield_now().await;
        true
    }

    /// Negotiate assignment of a task over an established handshake.
    ///
    /// Fails with `HandshakeError::NotFound` when the id was never resolved,
    /// which is what makes handshaking mandatory rather than advisory.
    pub async fn negotiate_task(
        &self,
        handshake_id: HandshakeId,
        task: &Task,
    ) -> Result<NegotiationResponse, HandshakeError> {
        let record = self
            .history
            .get(&handshake_id)
            .ok_or(HandshakeError::NotFound(handshake_id))?;

        debug!(
            %handshake_id,
            task_id = %task.id,
            target = %record.target_agent_id,
            "task negotiated"
        );

        Ok(NegotiationResponse {
            handshake_id,
            task_id: task.id.clone(),
            accepted: record.accepted,
            negotiated_at: Utc::now(),
        })
    }

    /// Sync opaque state over an established handshake.
    pub async fn sync_state(
        &self,
        handshake_id: HandshakeId,
        payload: serde_json::Value,
    ) -> Result<StateSyncResponse, HandshakeError> {
        if !self.history.contains_key(&handshake_id) {
            return Err(HandshakeError::NotFound(handshake_id));
        }

        debug!(
            %handshake_id,
            payload_bytes = payload.to_string().len(),
            "state synced"
        );

        Ok(StateSyncResponse {
            handshake_id,
            applied: true,
            synced_at: Utc::now(),
        })
    }

    /// Capabilities recorded for an agent from its most recent handshake.
    pub fn known_capabilities(&self, agent_id: &AgentId) -> Option<HashSet<String>> {
        self.capabilities.get(agent_id).map(|caps| caps.clone())
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::OrchestratorConfig;

    fn mediator() -> HandshakeMediator {
        HandshakeMediator::new(
            Arc::new(RwLock::new(OrchestratorConfig::default())),
            EventBus::with_default_capacity(),
        )
    }

    fn request() -> HandshakeRequest {
        HandshakeRequest::new(
            AgentId::new("coordinator"),
            AgentId::new("worker-1"),
            ["rust".to_string()].into(),
        )
    }

    #[tokio::test]
    async fn test_handshake_then_negotiate_and_sync_succeed() {
        let mediator = mediator();
        let response = mediator.initiate_handshake(request()).await.unwrap();
        assert!(response.success);
        assert!(response.accepted);
        let handshake_id = response.handshake_id.unwrap();

        let task = Task::new("t1", "fix the slow login bug");
        let negotiation = mediator.negotiate_task(handshake_id, &task).await.unwrap();
        assert!(negotiation.accepted);
        assert_eq!(negotiation.task_id, task.id);

        let sync = mediator
            .sync_state(handshake_id, serde_json::json!({"step": 1}))
            .await
            .unwrap();
        assert!(sync.applied);
    }

    #[tokio::test]
    async fn test_unknown_handshake_id_fails_negotiation_and_sync() {
        let mediator = mediator();
        let unknown = HandshakeId::new();
        let task = Task::new("t1", "anything");

        let negotiation = mediator.negotiate_task(unknown, &task).await;
        assert!(matches!(negotiation, Err(HandshakeError::NotFound(_))));

        let sync = mediator.sync_state(unknown, serde_json::json!({})).await;
        assert!(matches!(sync, Err(HandshakeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_disabled_handshaking_refuses_without_mutation() {
        let config = Arc::new(RwLock::new(OrchestratorConfig::default()));
        config.write().handshake.enabled = false;
        let mediator = HandshakeMediator::new(config, EventBus::with_default_capacity());

        let result = mediator.initiate_handshake(request()).await;
        assert!(matches!(result, Err(HandshakeError::Disabled)));
        assert_eq!(mediator.history_len(), 0);
        assert_eq!(mediator.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_capacity_ceiling_rejects_immediately() {
        let config = Arc::new(RwLock::new(OrchestratorConfig::default()));
        config.write().handshake.max_inflight = 0;
        let mediator = HandshakeMediator::new(config, EventBus::with_default_capacity());

        let result = mediator.initiate_handshake(request()).await;
        assert!(matches!(
            result,
            Err(HandshakeError::CapacityExceeded { ceiling: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_request_rejected_before_any_state() {
        let mediator = mediator();
        let mut bad = request();
        bad.target_agent_id = AgentId::new("  ");

        let result = mediator.initiate_handshake(bad).await;
        assert!(matches!(result, Err(HandshakeError::Validation(_))));
        assert_eq!(mediator.history_len(), 0);
    }

    #[tokio::test]
    async fn test_capabilities_recorded_from_handshake() {
        let mediator = mediator();
        mediator.initiate_handshake(request()).await.unwrap();

        let caps = mediator
            .known_capabilities(&AgentId::new("worker-1"))
            .unwrap();
        assert!(caps.contains("rust"));
    }
}
