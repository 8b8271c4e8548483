// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Agent Types
//!
//! A [`SwarmAgent`] is a registered delegate capable of receiving tasks.
//! Agents are registered by the orchestrator owner before delegation begins;
//! re-registering an id replaces the previous entry. Workload and capacity
//! are advisory load-balancing signals mutated on assignment and completion.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Caller-supplied identifier for an agent in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Agent type for programmatically driven (AutoGen-style) delegates.
pub const PROGRAMMATIC_AGENT_TYPE: &str = "autogen";

/// A registered member of the delegation pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmAgent {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub capabilities: HashSet<String>,
    /// Number of tasks currently assigned. Advisory only.
    #[serde(default)]
    pub workload: u32,
    /// Maximum concurrent tasks this agent advertises.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub is_local: bool,
    #[serde(rename = "type", default = "default_agent_type")]
    pub agent_type: String,
}

fn default_capacity() -> u32 {
    4
}

fn default_agent_type() -> String {
    "worker".to_string()
}

impl SwarmAgent {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(id),
            name: name.into(),
            capabilities: HashSet::new(),
            workload: 0,
            capacity: default_capacity(),
            is_local: false,
            agent_type: default_agent_type(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = agent_type.into();
        self
    }

    pub fn local(mut self) -> Self {
        self.is_local = true;
        self
    }

    pub fn has_capacity(&self) -> bool {
        self.workload < self.capacity
    }

    /// Fraction of advertised capacity currently in use.
    pub fn load_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        f64::from(self.workload) / f64::from(self.capacity)
    }

    pub fn is_programmatic(&self) -> bool {
        self.agent_type == PROGRAMMATIC_AGENT_TYPE
    }

    /// Number of registered capabilities that appear as substrings of the
    /// given task description (case-insensitive). Zero means no match.
    pub fn capability_score(&self, description: &str) -> usize {
        let haystack = description.to_ascii_lowercase();
        self.capabilities
            .iter()
            .filter(|cap| !cap.is_empty() && haystack.contains(&cap.to_ascii_lowercase()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_score_is_substring_match() {
        let agent = SwarmAgent::new("a1", "debugger").with_capabilities(["login", "bug", "perf"]);
        assert_eq!(agent.capability_score("fix the slow login bug"), 2);
        assert_eq!(agent.capability_score("write documentation"), 0);
    }

    #[test]
    fn test_load_ratio_and_capacity() {
        let mut agent = SwarmAgent::new("a1", "worker");
        assert!(agent.has_capacity());
        agent.workload = agent.capacity;
        assert!(!agent.has_capacity());
        assert_eq!(agent.load_ratio(), 1.0);

        agent.capacity = 0;
        assert_eq!(agent.load_ratio(), 1.0);
    }

    #[test]
    fn test_agent_deserializes_with_defaults() {
        let agent: SwarmAgent =
            serde_json::from_str(r#"{"id":"a1","name":"helper","capabilities":["rust"]}"#).unwrap();
        assert_eq!(agent.agent_type, "worker");
        assert_eq!(agent.capacity, 4);
        assert!(!agent.is_local);
        assert!(!agent.is_programmatic());
    }
}
