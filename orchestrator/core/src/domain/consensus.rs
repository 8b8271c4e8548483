// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Consensus Voting Types
//!
//! When no fast-path or preferred route exists, a one-shot weighted vote
//! among registered agents picks the delegate. A session is created and
//! closed exactly once per delegation attempt that reaches this stage and
//! holds no state afterwards.

use crate::domain::agent::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for one consensus session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One selectable option in a session, usually a candidate agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusOption {
    pub id: String,
    pub label: String,
    pub value: serde_json::Value,
}

/// A single agent's vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub option_id: String,
    pub weight: f64,
    pub rationale: String,
}

/// In-flight voting session.
#[derive(Debug, Clone)]
pub struct ConsensusSession {
    pub id: SessionId,
    pub topic: String,
    pub options: Vec<ConsensusOption>,
    /// One vote per agent; a later vote from the same agent replaces the
    /// earlier one.
    pub votes: HashMap<AgentId, Vote>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// How votes are aggregated when a session closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStrategy {
    /// Sum vote weights per option; highest aggregate wins.
    WeightedMajority,
    /// Count votes per option, ignoring weights.
    SimpleMajority,
}

/// Terminal result of a closed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusOutcome {
    pub session_id: SessionId,
    pub consensus_reached: bool,
    pub winning_option: Option<ConsensusOption>,
    /// Aggregate weight (or count) per option id.
    pub tally: HashMap<String, f64>,
    pub strategy: ConsensusStrategy,
}

/// Errors produced by the consensus coordinator.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("consensus session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("vote names unknown option '{option_id}'")]
    UnknownOption { option_id: String },
}
