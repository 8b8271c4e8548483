// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Fast-Path Route Cache
//!
//! Remembers which agent last successfully handled a task pattern so repeat
//! delegations skip consensus voting. Entries expire after a TTL; an expired
//! entry found during lookup is evicted and reported as a miss.

use crate::domain::agent::AgentId;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    agent_id: AgentId,
    recorded_at: Instant,
}

/// TTL-bounded map from route signature to the agent that last handled it.
pub struct FastPathRouteCache {
    entries: DashMap<String, CacheEntry>,
}

impl FastPathRouteCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up the agent cached for a signature. Evicts and misses if the
    /// entry has outlived `ttl`.
    pub fn lookup(&self, signature: &str, ttl: Duration) -> Option<AgentId> {
        let expired = match self.entries.get(signature) {
            Some(entry) => {
                if entry.recorded_at.elapsed() <= ttl {
                    debug!(signature, agent_id = %entry.agent_id, "fast-path cache hit");
                    return Some(entry.agent_id.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(signature);
            debug!(signature, "fast-path cache entry expired, evicted");
        }
        None
    }

    /// Record a successful routing decision for a signature.
    pub fn record(&self, signature: impl Into<String>, agent_id: AgentId) {
        let signature = signature.into();
        debug!(signature = %signature, agent_id = %agent_id, "fast-path cache recorded");
        self.entries.insert(
            signature,
            CacheEntry {
                agent_id,
                recorded_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FastPathRouteCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_returns_recorded_agent() {
        let cache = FastPathRouteCache::new();
        cache.record("mode-default|fix-slow-login", AgentId::new("a1"));

        let hit = cache.lookup("mode-default|fix-slow-login", Duration::from_secs(5));
        assert_eq!(hit, Some(AgentId::new("a1")));
        assert_eq!(cache.lookup("mode-default|other", Duration::from_secs(5)), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_lookup() {
        let cache = FastPathRouteCache::new();
        cache.record("sig", AgentId::new("a1"));

        tokio::time::sleep(Duration::from_millis(15)).await;

        assert_eq!(cache.lookup("sig", Duration::from_millis(5)), None);
        // The expired entry is gone, not just hidden.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_record_replaces_previous_agent() {
        let cache = FastPathRouteCache::new();
        cache.record("sig", AgentId::new("a1"));
        cache.record("sig", AgentId::new("a2"));

        assert_eq!(
            cache.lookup("sig", Duration::from_secs(5)),
            Some(AgentId::new("a2"))
        );
        assert_eq!(cache.len(), 1);
    }
}
