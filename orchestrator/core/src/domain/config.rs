// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration Types
//
// Defines the configuration schema for a delegation orchestrator instance:
// - timing budgets (handshake, retry backoff, latency target)
// - concurrency ceilings (in-flight handshakes, backend invocations)
// - backend bootstrap (endpoints, models, env-resolved API keys)
// - initial agent pool
//
// Loaded from a YAML manifest by the CLI; mutable at runtime through
// ConfigPatch applied by the owning orchestrator.

use crate::domain::agent::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Operating mode of the orchestrator. Participates in fast-path cache keys
/// so routing decisions never leak across modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatingMode {
    /// All delegation sources considered.
    Default,
    /// Programmatic (AutoGen-style) agents are skipped; local agents and the
    /// local backend are preferred.
    LocalOnly,
}

impl Default for OperatingMode {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::LocalOnly => f.write_str("local-only"),
        }
    }
}

/// Handshake mediator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeConfig {
    /// Administrative kill switch. When false every handshake is refused.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Hard cap on simultaneously in-flight handshakes. Requests beyond the
    /// cap are rejected immediately, not queued.
    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,
    /// Round-trip budget for one handshake.
    #[serde(default = "default_handshake_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_inflight: default_max_inflight(),
            timeout_ms: default_handshake_timeout_ms(),
        }
    }
}

/// Fallback-chain invoker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Retries per backend before escalating to the next one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Overall latency target for one logical inference call. Exceeding it
    /// is an observability signal, not an error.
    #[serde(default = "default_latency_target_ms")]
    pub latency_target_ms: u64,
    /// System-wide cap on simultaneous backend invocations.
    #[serde(default = "default_max_concurrent_invocations")]
    pub max_concurrent_invocations: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            latency_target_ms: default_latency_target_ms(),
            max_concurrent_invocations: default_max_concurrent_invocations(),
        }
    }
}

/// Fast-path route cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastPathConfig {
    /// Entries older than this are treated as misses and evicted on lookup.
    #[serde(default = "default_fast_path_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for FastPathConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_fast_path_ttl_ms(),
        }
    }
}

/// Bootstrap description of one inference backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Stable backend name; also its position in the fallback order.
    pub name: String,
    /// Adapter type: "ollama" or "openai-compatible".
    #[serde(rename = "type")]
    pub backend_type: String,
    pub endpoint: String,
    pub model: String,
    /// Plain key, or "env:VAR_NAME" to read from the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl BackendConfig {
    /// Resolve the API key, supporting "env:VAR_NAME" indirection.
    pub fn resolve_api_key(&self) -> anyhow::Result<String> {
        match &self.api_key {
            Some(k) if k.starts_with("env:") => {
                let var_name = k.trim_start_matches("env:");
                std::env::var(var_name)
                    .map_err(|_| anyhow::anyhow!("environment variable not set: {}", var_name))
            }
            Some(k) => Ok(k.clone()),
            // Local backends run without auth.
            None => Ok(String::new()),
        }
    }
}

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub mode: OperatingMode,
    /// Agent id the orchestrator uses as handshake source.
    #[serde(default = "default_coordinator_id")]
    pub coordinator_id: AgentId,
    #[serde(default)]
    pub handshake: HandshakeConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub fast_path: FastPathConfig,
    /// Backend bootstrap, in fallback priority order.
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
    /// Initial agent pool registered at startup.
    #[serde(default)]
    pub agents: Vec<crate::domain::agent::SwarmAgent>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            coordinator_id: default_coordinator_id(),
            handshake: HandshakeConfig::default(),
            fallback: FallbackConfig::default(),
            fast_path: FastPathConfig::default(),
            backends: Vec::new(),
            agents: Vec::new(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.handshake.max_inflight == 0 {
            anyhow::bail!("handshake.max_inflight must be at least 1");
        }
        if self.fallback.max_retries == 0 {
            anyhow::bail!("fallback.max_retries must be at least 1");
        }
        if self.fallback.max_concurrent_invocations == 0 {
            anyhow::bail!("fallback.max_concurrent_invocations must be at least 1");
        }
        for backend in &self.backends {
            match backend.backend_type.as_str() {
                "ollama" | "openai-compatible" => {}
                other => anyhow::bail!("unsupported backend type: {}", other),
            }
        }
        Ok(())
    }
}

/// Partial runtime update, applied by the owning orchestrator under its
/// config lock. Absent fields leave the current value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub mode: Option<OperatingMode>,
    pub handshake_enabled: Option<bool>,
    pub max_inflight_handshakes: Option<usize>,
    pub handshake_timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub latency_target_ms: Option<u64>,
    pub fast_path_ttl_ms: Option<u64>,
}

impl ConfigPatch {
    pub fn apply(&self, config: &mut OrchestratorConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(enabled) = self.handshake_enabled {
            config.handshake.enabled = enabled;
        }
        if let Some(max) = self.max_inflight_handshakes {
            config.handshake.max_inflight = max;
        }
        if let Some(timeout) = self.handshake_timeout_ms {
            config.handshake.timeout_ms = timeout;
        }
        if let Some(retries) = self.max_retries {
            config.fallback.max_retries = retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.fallback.retry_delay_ms = delay;
        }
        if let Some(target) = self.latency_target_ms {
            config.fallback.latency_target_ms = target;
        }
        if let Some(ttl) = self.fast_path_ttl_ms {
            config.fast_path.ttl_ms = ttl;
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_inflight() -> usize {
    32
}

fn default_handshake_timeout_ms() -> u64 {
    1_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_latency_target_ms() -> u64 {
    2_000
}

fn default_max_concurrent_invocations() -> usize {
    8
}

fn default_fast_path_ttl_ms() -> u64 {
    5_000
}

fn default_coordinator_id() -> AgentId {
    AgentId::new("coordinator")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OrchestratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fast_path.ttl_ms, 5_000);
        assert_eq!(config.fallback.latency_target_ms, 2_000);
        assert_eq!(config.coordinator_id.as_str(), "coordinator");
    }

    #[test]
    fn test_patch_leaves_absent_fields_untouched() {
        let mut config = OrchestratorConfig::default();
        let patch = ConfigPatch {
            handshake_enabled: Some(false),
            latency_target_ms: Some(500),
            ..Default::default()
        };
        patch.apply(&mut config);
        assert!(!config.handshake.enabled);
        assert_eq!(config.fallback.latency_target_ms, 500);
        assert_eq!(config.handshake.max_inflight, 32);
        assert_eq!(config.mode, OperatingMode::Default);
    }

    #[test]
    fn test_manifest_parses_from_yaml() {
        let yaml = r#"
mode: local-only
handshake:
  max_inflight: 4
backends:
  - name: local
    type: ollama
    endpoint: http://localhost:11434
    model: llama3.2
agents:
  - id: a1
    name: helper
    capabilities: [rust]
    is_local: true
"#;
        let config: OrchestratorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mode, OperatingMode::LocalOnly);
        assert_eq!(config.handshake.max_inflight, 4);
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.agents.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_manifest_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nexus.yaml");
        std::fs::write(&path, "mode: default\nfast_path:\n  ttl_ms: 250\n").unwrap();

        let config = OrchestratorConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.fast_path.ttl_ms, 250);

        let missing = OrchestratorConfig::from_yaml_file(&dir.path().join("absent.yaml"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_rejects_unknown_backend_type() {
        let mut config = OrchestratorConfig::default();
        config.backends.push(BackendConfig {
            name: "weird".to_string(),
            backend_type: "carrier-pigeon".to_string(),
            endpoint: String::new(),
            model: String::new(),
            api_key: None,
            enabled: true,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_env_resolution() {
        let backend = BackendConfig {
            name: "remote".to_string(),
            backend_type: "openai-compatible".to_string(),
            endpoint: "https://api.example.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: Some("env:NEXUS_TEST_KEY_THAT_IS_UNSET".to_string()),
            enabled: true,
        };
        assert!(backend.resolve_api_key().is_err());

        let plain = BackendConfig {
            api_key: Some("sk-123".to_string()),
            ..backend
        };
        assert_eq!(plain.resolve_api_key().unwrap(), "sk-123");
    }
}
