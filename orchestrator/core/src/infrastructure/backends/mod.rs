// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

// Inference Backend Adapters
//
// Anti-Corruption Layer implementations of the InferenceBackend domain
// interface. The fallback chain tries these in the order they are built.

pub mod ollama;
pub mod openai;

use crate::domain::backend::{BackendError, InferenceBackend};
use crate::domain::config::BackendConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub use ollama::OllamaBackend;
pub use openai::OpenAiCompatibleBackend;

/// Build backend adapters from bootstrap configuration, preserving the
/// configured fallback order. Disabled entries are skipped.
pub fn from_config(configs: &[BackendConfig]) -> anyhow::Result<Vec<Arc<dyn InferenceBackend>>> {
    let mut backends: Vec<Arc<dyn InferenceBackend>> = Vec::new();

    for config in configs {
        if !config.enabled {
            info!("Backend '{}' disabled, skipping", config.name);
            continue;
        }

        info!("Initializing backend: {} ({})", config.name, config.backend_type);

        let backend: Arc<dyn InferenceBackend> = match config.backend_type.as_str() {
            "ollama" => Arc::new(OllamaBackend::new(
                config.name.clone(),
                config.endpoint.clone(),
                config.model.clone(),
            )),
            "openai-compatible" => {
                let api_key = config.resolve_api_key()?;
                Arc::new(OpenAiCompatibleBackend::new(
                    config.name.clone(),
                    config.endpoint.clone(),
                    api_key,
                    config.model.clone(),
                ))
            }
            other => anyhow::bail!("unsupported backend type: {}", other),
        };

        backends.push(backend);
    }

    Ok(backends)
}

/// Probe every backend, reporting availability by name.
pub async fn health_check_all(
    backends: &[Arc<dyn InferenceBackend>],
) -> HashMap<String, bool> {
    let mut results = HashMap::new();
    for backend in backends {
        info!("Health checking backend: {}", backend.name());
        results.insert(backend.name().to_string(), backend.probe_available().await);
    }
    results
}

/// Map a reqwest failure onto the backend error taxonomy.
pub(crate) fn classify_request_error(
    err: reqwest::Error,
    timeout: Option<std::time::Duration>,
) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(timeout.unwrap_or_default())
    } else if err.is_connect() {
        BackendError::Unavailable(err.to_string())
    } else {
        BackendError::Network(err.to_string())
    }
}
