// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Consensus Voting Coordinator
//!
//! One-shot weighted voting used to pick a delegate when no cached or
//! preferred route exists. Sessions are created and closed exactly once per
//! delegation attempt; closing removes the session entirely.

use crate::domain::agent::AgentId;
use crate::domain::consensus::{
    ConsensusError, ConsensusOption, ConsensusOutcome, ConsensusSession, ConsensusStrategy,
    SessionId, Vote,
};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct ConsensusCoordinator {
    sessions: DashMap<SessionId, ConsensusSession>,
}

impl ConsensusCoordinator {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn create_session(
        &self,
        topic: impl Into<String>,
        options: Vec<ConsensusOption>,
    ) -> SessionId {
        let session_id = SessionId::new();
        let topic = topic.into();
        debug!(%session_id, topic = %topic, options = options.len(), "consensus session created");

        self.sessions.insert(
            session_id,
            ConsensusSession {
                id: session_id,
                topic,
                options,
                votes: HashMap::new(),
                created_at: Utc::now(),
            },
        );
        session_id
    }

    /// Record one agent's vote. A later vote from the same agent replaces
    /// its earlier one.
    pub fn cast_vote(
        &self,
        session_id: SessionId,
        agent_id: AgentId,
        option_id: impl Into<String>,
        weight: f64,
        rationale: impl Into<String>,
    ) -> Result<(), ConsensusError> {
        let option_id = option_id.into();
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(ConsensusError::SessionNotFound(session_id))?;

        if !session.options.iter().any(|o| o.id == option_id) {
            return Err(ConsensusError::UnknownOption { option_id });
        }

        debug!(%session_id, agent = %agent_id, option_id = %option_id, weight, "vote cast");
        session.votes.insert(
            agent_id,
            Vote {
                option_id,
                weight,
                rationale: rationale.into(),
            },
        );
        Ok(())
    }

    /// Close a session, aggregate its votes, and discard it.
    ///
    /// A session with no options or no votes cannot reach consensus; the
    /// outcome reports failure rather than silently picking a default.
    pub fn close_session(
        &self,
        session_id: SessionId,
        strategy: ConsensusStrategy,
    ) -> Result<ConsensusOutcome, ConsensusError> {
        let (_, session) = self
            .sessions
            .remove(&session_id)
            .ok_or(ConsensusError::SessionNotFound(session_id))?;

        let mut tally: HashMap<String, f64> = HashMap::new();
        for vote in session.votes.values() {
            let weight = match strategy {
                ConsensusStrategy::WeightedMajority => vote.weight,
                ConsensusStrategy::SimpleMajority => 1.0,
            };
            *tally.entry(vote.option_id.clone()).or_insert(0.0) += weight;
        }

        // Ties break toward the lexicographically smaller option id so a
        // close is deterministic.
        let winner_id = tally
            .iter()
            .max_by(|(id_a, weight_a), (id_b, weight_b)| {
                weight_a
                    .partial_cmp(weight_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| id_b.cmp(id_a))
            })
            .map(|(id, _)| id.clone());

        let winning_option = winner_id
            .and_then(|id| session.options.iter().find(|o| o.id == id).cloned());
        let consensus_reached = winning_option.is_some();

        info!(
            %session_id,
            topic = %session.topic,
            consensus_reached,
            votes = session.votes.len(),
            "consensus session closed"
        );

        Ok(ConsensusOutcome {
            session_id,
            consensus_reached,
            winning_option,
            tally,
            strategy,
        })
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for ConsensusCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
