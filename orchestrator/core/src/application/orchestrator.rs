// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Delegation Orchestrator
//!
//! Top-level entry point for delegating a task to the agent pool. One
//! delegation walks candidate sources in fixed priority order (fast-path
//! cache, programmatic AutoGen-style agent, local agent, consensus winner)
//! and returns on the first source that completes a successful handshake,
//! context handoff, and fallback-chain invocation. A handshake rejection at
//! any source is fatal to that source only; the orchestrator falls through
//! to the next source rather than retrying the same one.
//!
//! The orchestrator owns the agent registry, the fast-path cache, and the
//! shared configuration. It is an explicitly constructed instance passed by
//! reference to callers; there is no ambient global state.

use crate::application::consensus::ConsensusCoordinator;
use crate::application::fallback::FallbackChainInvoker;
use crate::application::handoff_manager::ContextHandoffManager;
use crate::application::handshake_mediator::HandshakeMediator;
use crate::domain::agent::{AgentId, SwarmAgent};
use crate::domain::backend::{InferenceBackend, InvocationOptions};
use crate::domain::codec::ContextCodec;
use crate::domain::config::{ConfigPatch, OperatingMode, OrchestratorConfig};
use crate::domain::consensus::{ConsensusOption, ConsensusStrategy};
use crate::domain::delegation::{
    DelegationMetrics, DelegationResult, DelegationSource, SourceError,
};
use crate::domain::events::DelegationEvent;
use crate::domain::handoff::{ContextHandoffRequest, ContextMap};
use crate::domain::handshake::{HandshakeError, HandshakeRequest};
use crate::domain::routing::route_signature;
use crate::domain::task::Task;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::route_cache::FastPathRouteCache;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Weight of an agent's vote for itself when its capabilities match.
const SELF_VOTE_WEIGHT: f64 = 1.0;

/// Weight of the default vote cast by agents without a capability match.
const DEFAULT_VOTE_WEIGHT: f64 = 0.25;

/// Sources walked per delegation, in fixed priority order.
const SOURCE_ORDER: [DelegationSource; 4] = [
    DelegationSource::FastPath,
    DelegationSource::Programmatic,
    DelegationSource::Local,
    DelegationSource::Consensus,
];

pub struct DelegationOrchestrator {
    config: Arc<RwLock<OrchestratorConfig>>,
    registry: DashMap<AgentId, SwarmAgent>,
    mediator: HandshakeMediator,
    handoffs: ContextHandoffManager,
    consensus: ConsensusCoordinator,
    invoker: FallbackChainInvoker,
    route_cache: FastPathRouteCache,
    bus: EventBus,
}

impl DelegationOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        codec: Arc<dyn ContextCodec>,
        backends: Vec<Arc<dyn InferenceBackend>>,
        bus: EventBus,
    ) -> Self {
        let config = Arc::new(RwLock::new(config));
        Self {
            mediator: HandshakeMediator::new(config.clone(), bus.clone()),
            handoffs: ContextHandoffManager::new(codec, bus.clone()),
            consensus: ConsensusCoordinator::new(),
            invoker: FallbackChainInvoker::new(backends, config.clone(), bus.clone()),
            route_cache: FastPathRouteCache::new(),
            registry: DashMap::new(),
            config,
            bus,
        }
    }

    /// Register an agent in the pool. Registering an existing id replaces
    /// the entry rather than duplicating it.
    pub fn register_agent(&self, agent: SwarmAgent) {
        info!(agent_id = %agent.id, name = %agent.name, "agent registered");
        self.registry.insert(agent.id.clone(), agent);
    }

    pub fn registered_agents(&self) -> Vec<SwarmAgent> {
        self.registry.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Apply a partial configuration update.
    pub fn update_config(&self, patch: ConfigPatch) {
        let mut config = self.config.write();
        patch.apply(&mut config);
        info!(mode = %config.mode, "configuration updated");
    }

    pub fn config_snapshot(&self) -> OrchestratorConfig {
        self.config.read().clone()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn handshake_mediator(&self) -> &HandshakeMediator {
        &self.mediator
    }

    pub fn handoff_manager(&self) -> &ContextHandoffManager {
        &self.handoffs
    }

    pub fn invoker(&self) -> &FallbackChainInvoker {
        &self.invoker
    }

    /// Delegate one task through the pipeline.
    ///
    /// Always returns a [`DelegationResult`]; failures are folded into it
    /// rather than surfaced as errors.
    pub async fn delegate_task(&self, task: &Task, context: ContextMap) -> DelegationResult {
        let started = Instant::now();
        self.bus.publish_delegation_event(DelegationEvent::Started {
            task_id: task.id.clone(),
            started_at: Utc::now(),
        });

        let mode = self.config.read().mode;
        let signature = route_signature(mode, &task.description);
        let mut last_error: Option<String> = None;

        for source in SOURCE_ORDER {
            let candidate = match self.select_candidate(source, task, &signature, mode) {
                Ok(Some(agent_id)) => agent_id,
                Ok(None) => {
                    debug!(task_id = %task.id, %source, "no candidate from source");
                    continue;
                }
                Err(e) => {
                    warn!(task_id = %task.id, %source, error = %e, "source selection failed");
                    self.publish_source_failed(task, source, &e);
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            debug!(task_id = %task.id, %source, agent_id = %candidate, "attempting delegation source");

            match self.attempt_source(&candidate, task, &context).await {
                Ok(output) => {
                    self.route_cache.record(&signature, candidate.clone());
                    return self.finish_success(task, source, candidate, output, started);
                }
                Err(e) => {
                    warn!(
                        task_id = %task.id,
                        %source,
                        agent_id = %candidate,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "delegation source failed"
                    );
                    self.publish_source_failed(task, source, &e);
                    let fatal = Self::is_fatal(&e);
                    last_error = Some(e.to_string());
                    if fatal {
                        break;
                    }
                }
            }
        }

        self.finish_failure(task, last_error, started)
    }

    /// Pick this source's candidate agent, if it has one.
    fn select_candidate(
        &self,
        source: DelegationSource,
        task: &Task,
        signature: &str,
        mode: OperatingMode,
    ) -> Result<Option<AgentId>, SourceError> {
        match source {
            DelegationSource::FastPath => {
                let ttl = Duration::from_millis(self.config.read().fast_path.ttl_ms);
                let cached = self.route_cache.lookup(signature, ttl);
                // A cached agent that has since been unregistered is a miss.
                Ok(cached.filter(|agent_id| self.registry.contains_key(agent_id)))
            }
            DelegationSource::Programmatic => {
                if mode == OperatingMode::LocalOnly {
                    return Ok(None);
                }
                let best = self
                    .registry
                    .iter()
                    .filter(|entry| entry.value().is_programmatic() && entry.value().has_capacity())
                    .filter_map(|entry| {
                        let score = entry.value().capability_score(&task.description);
                        (score > 0).then(|| (score, entry.key().clone()))
                    })
                    .max_by_key(|(score, agent_id)| (*score, std::cmp::Reverse(agent_id.as_str().to_string())));
                Ok(best.map(|(_, agent_id)| agent_id))
            }
            DelegationSource::Local => Ok(self.least_loaded(|agent| agent.is_local)),
            DelegationSource::Consensus => self.consensus_candidate(task).map(Some),
        }
    }

    /// Least-loaded agent matching a predicate, with spare capacity. Ties
    /// break toward the smaller agent id so selection is deterministic.
    fn least_loaded(&self, predicate: impl Fn(&SwarmAgent) -> bool) -> Option<AgentId> {
        self.registry
            .iter()
            .filter(|entry| predicate(entry.value()) && entry.value().has_capacity())
            .min_by(|a, b| {
                a.value()
                    .load_ratio()
                    .partial_cmp(&b.value().load_ratio())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.key().as_str().cmp(b.key().as_str()))
            })
            .map(|entry| entry.key().clone())
    }

    /// Run a one-shot weighted vote among all registered agents.
    ///
    /// Each agent votes for itself when its capability set matches the task
    /// description, otherwise it casts a lower-weighted default vote for the
    /// least-loaded agent.
    fn consensus_candidate(&self, task: &Task) -> Result<AgentId, SourceError> {
        let agents = self.registered_agents();
        if agents.is_empty() {
            return Err(SourceError::NoConsensus("no registered agents".to_string()));
        }

        let options: Vec<ConsensusOption> = agents
            .iter()
            .map(|agent| ConsensusOption {
                id: agent.id.to_string(),
                label: agent.name.clone(),
                value: serde_json::json!({
                    "workload": agent.workload,
                    "capacity": agent.capacity,
                }),
            })
            .collect();

        let session_id = self
            .consensus
            .create_session(format!("delegate task {}", task.id), options);

        let default_choice = agents
            .iter()
            .min_by(|a, b| {
                a.load_ratio()
                    .partial_cmp(&b.load_ratio())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.as_str().cmp(b.id.as_str()))
            })
            .map(|agent| agent.id.to_string())
            .unwrap_or_default();

        for agent in &agents {
            let score = agent.capability_score(&task.description);
            let vote = if score > 0 {
                (
                    agent.id.to_string(),
                    SELF_VOTE_WEIGHT,
                    format!("capability match ({})", score),
                )
            } else {
                (
                    default_choice.clone(),
                    DEFAULT_VOTE_WEIGHT,
                    "no capability match, deferring to least-loaded".to_string(),
                )
            };
            self.consensus
                .cast_vote(session_id, agent.id.clone(), vote.0, vote.1, vote.2)
                .map_err(|e| SourceError::NoConsensus(e.to_string()))?;
        }

        let outcome = self
            .consensus
            .close_session(session_id, ConsensusStrategy::WeightedMajority)
            .map_err(|e| SourceError::NoConsensus(e.to_string()))?;

        match outcome.winning_option {
            Some(option) if outcome.consensus_reached => Ok(AgentId::new(option.id)),
            _ => Err(SourceError::NoConsensus("vote produced no winner".to_string())),
        }
    }

    /// Drive one source end to end: handshake guard, context handoff, then
    /// inference through the fallback chain.
    async fn attempt_source(
        &self,
        agent_id: &AgentId,
        task: &Task,
        context: &ContextMap,
    ) -> Result<String, SourceError> {
        let agent = self
            .registry
            .get(agent_id)
            .map(|entry| entry.value().clone())
            .ok_or(SourceError::NoCandidate)?;

        // No handshake, no delegation through this source.
        let coordinator_id = self.config.read().coordinator_id.clone();
        let handshake_request =
            HandshakeRequest::new(coordinator_id.clone(), agent.id.clone(), agent.capabilities.clone());

        let handshake = self
            .mediator
            .initiate_handshake(handshake_request)
            .await
            .map_err(|e| SourceError::Handshake {
                agent: agent.id.clone(),
                source: e,
            })?;

        let handshake_id = match (handshake.accepted, handshake.handshake_id) {
            (true, Some(id)) => id,
            _ => {
                return Err(SourceError::Handshake {
                    agent: agent.id.clone(),
                    source: HandshakeError::Rejected {
                        target: agent.id.clone(),
                        reason: handshake
                            .error
                            .unwrap_or_else(|| "handshake not accepted".to_string()),
                    },
                })
            }
        };

        let negotiation = self
            .mediator
            .negotiate_task(handshake_id, task)
            .await
            .map_err(|e| SourceError::Handshake {
                agent: agent.id.clone(),
                source: e,
            })?;
        if !negotiation.accepted {
            return Err(SourceError::Handshake {
                agent: agent.id.clone(),
                source: HandshakeError::Rejected {
                    target: agent.id.clone(),
                    reason: "task negotiation declined".to_string(),
                },
            });
        }

        let handoff_request = ContextHandoffRequest {
            source_agent_id: coordinator_id,
            target_agent_id: agent.id.clone(),
            task_id: task.id.clone(),
            context: context.clone(),
            priority: task.priority,
            deadline: None,
        };
        let handoff = self
            .handoffs
            .initiate_handoff(handoff_request)
            .await
            .map_err(|e| SourceError::Handoff {
                agent: agent.id.clone(),
                source: e,
            })?;
        let delivered = self
            .handoffs
            .complete_handoff(handoff.handoff_id, &agent.id)
            .await
            .map_err(|e| SourceError::Handoff {
                agent: agent.id.clone(),
                source: e,
            })?;

        let prompt = build_prompt(task, &delivered);

        self.adjust_workload(&agent.id, 1);
        let invocation = self
            .invoker
            .invoke(&prompt, &InvocationOptions::default())
            .await;
        self.adjust_workload(&agent.id, -1);

        match invocation {
            Ok(outcome) => Ok(outcome.text),
            Err(e) => Err(SourceError::Invocation {
                agent: agent.id.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn adjust_workload(&self, agent_id: &AgentId, delta: i64) {
        if let Some(mut agent) = self.registry.get_mut(agent_id) {
            agent.workload = if delta >= 0 {
                agent.workload.saturating_add(delta as u32)
            } else {
                agent.workload.saturating_sub((-delta) as u32)
            };
        }
    }

    /// Administrative refusals, capacity rejections, and validation errors
    /// end the whole delegation; protocol and backend errors only end the
    /// current source.
    fn is_fatal(error: &SourceError) -> bool {
        matches!(
            error,
            SourceError::Handshake {
                source: HandshakeError::Disabled
                    | HandshakeError::CapacityExceeded { .. }
                    | HandshakeError::Validation(_),
                ..
            }
        )
    }

    fn publish_source_failed(&self, task: &Task, source: DelegationSource, error: &SourceError) {
        self.bus.publish_delegation_event(DelegationEvent::SourceFailed {
            task_id: task.id.clone(),
            source,
            reason: error.to_string(),
            failed_at: Utc::now(),
        });
    }

    fn finish_success(
        &self,
        task: &Task,
        source: DelegationSource,
        agent_id: AgentId,
        output: String,
        started: Instant,
    ) -> DelegationResult {
        let duration = started.elapsed();
        let duration_ms = duration.as_millis() as u64;
        let latency_target_ms = self.config.read().fallback.latency_target_ms;

        self.bus.publish_delegation_event(DelegationEvent::Completed {
            task_id: task.id.clone(),
            agent_id: agent_id.clone(),
            source,
            duration_ms,
            completed_at: Utc::now(),
        });
        info!(
            task_id = %task.id,
            agent_id = %agent_id,
            %source,
            duration_ms,
            "delegation completed"
        );

        DelegationResult {
            success: true,
            task_id: task.id.clone(),
            delegated_to: Some(agent_id),
            output: Some(output),
            error: None,
            metrics: DelegationMetrics {
                duration_ms,
                latency_within_target: duration_ms <= latency_target_ms,
            },
        }
    }

    fn finish_failure(
        &self,
        task: &Task,
        last_error: Option<String>,
        started: Instant,
    ) -> DelegationResult {
        let duration = started.elapsed();
        let duration_ms = duration.as_millis() as u64;
        let latency_target_ms = self.config.read().fallback.latency_target_ms;
        let reason = last_error.unwrap_or_else(|| "no delegation source available".to_string());

        self.bus.publish_delegation_event(DelegationEvent::Failed {
            task_id: task.id.clone(),
            reason: reason.clone(),
            duration_ms,
            failed_at: Utc::now(),
        });
        warn!(task_id = %task.id, duration_ms, reason = %reason, "delegation failed");

        DelegationResult {
            success: false,
            task_id: task.id.clone(),
            delegated_to: None,
            output: None,
            error: Some(reason),
            metrics: DelegationMetrics {
                duration_ms,
                latency_within_target: duration_ms <= latency_target_ms,
            },
        }
    }
}

/// Render the prompt handed to the inference backend from the task and its
/// delivered context.
fn build_prompt(task: &Task, context: &ContextMap) -> String {
    let mut prompt = format!(
        "Task {} ({}): {}",
        task.id, task.task_type, task.description
    );
    if !context.is_empty() {
        let rendered = serde_json::to_string_pretty(context).unwrap_or_default();
        prompt.push_str("\n\nContext:\n");
        prompt.push_str(&rendered);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskPriority;

    #[test]
    fn test_build_prompt_includes_context_when_present() {
        let task = Task::new("t1", "fix the slow login bug").with_priority(TaskPriority::High);
        let mut context = ContextMap::new();
        context.insert("file".to_string(), serde_json::json!("auth.rs"));

        let prompt = build_prompt(&task, &context);
        assert!(prompt.contains("t1"));
        assert!(prompt.contains("auth.rs"));

        let bare = build_prompt(&task, &ContextMap::new());
        assert!(!bare.contains("Context:"));
    }
}
