// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures for orchestrator integration tests.

use async_trait::async_trait;
use nexus_orchestrator_core::domain::backend::{BackendError, InferenceBackend, InvocationOptions};
use nexus_orchestrator_core::domain::config::OrchestratorConfig;
use nexus_orchestrator_core::infrastructure::codec::DeflateContextCodec;
use nexus_orchestrator_core::infrastructure::event_bus::EventBus;
use nexus_orchestrator_core::application::DelegationOrchestrator;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Backend whose availability and responses are controlled by the test.
pub struct ScriptedBackend {
    name: String,
    available: AtomicBool,
    response: Option<String>,
    invocations: AtomicU32,
}

impl ScriptedBackend {
    /// A backend that answers every invocation with `response`.
    pub fn answering(name: &str, response: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            available: AtomicBool::new(true),
            response: Some(response.to_string()),
            invocations: AtomicU32::new(0),
        })
    }

    /// A backend that fails every invocation.
    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            available: AtomicBool::new(true),
            response: None,
            invocations: AtomicU32::new(0),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn invoke(&self, _: &str, _: &InvocationOptions) -> Result<String, BackendError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(BackendError::Provider("scripted failure".to_string())),
        }
    }
}

/// Orchestrator wired with the zlib codec and the given backends.
pub fn orchestrator(
    config: OrchestratorConfig,
    backends: Vec<Arc<dyn InferenceBackend>>,
) -> DelegationOrchestrator {
    DelegationOrchestrator::new(
        config,
        Arc::new(DeflateContextCodec::new()),
        backends,
        EventBus::with_default_capacity(),
    )
}

/// Config with backoff timings tightened so failure paths stay fast.
pub fn fast_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.fallback.retry_delay_ms = 1;
    config
}
