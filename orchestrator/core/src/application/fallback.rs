// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Fallback-Chain Invoker
//!
//! Drives a single logical inference call across an ordered list of
//! backends. An unavailable backend is skipped; a failing backend is retried
//! with exponential backoff before the chain escalates to the next one.
//! Exceeding the configured latency target is an observability signal, not
//! an error.

use crate::domain::backend::{InferenceBackend, InvocationOptions};
use crate::domain::config::OrchestratorConfig;
use crate::domain::events::InferenceEvent;
use crate::infrastructure::event_bus::EventBus;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Successful result of one logical inference call.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub text: String,
    /// Name of the backend that produced the text.
    pub backend: String,
    pub elapsed: Duration,
    /// Total invocation attempts across all backends, including failures.
    pub attempts: u32,
}

/// Terminal failure of the whole chain.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("no inference backends configured")]
    NoBackends,

    #[error("all inference backends exhausted after {attempts} attempts; last error: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

pub struct FallbackChainInvoker {
    backends: Vec<Arc<dyn InferenceBackend>>,
    config: Arc<RwLock<OrchestratorConfig>>,
    /// System-wide cap on simultaneous backend invocations.
    permits: Arc<Semaphore>,
    bus: EventBus,
}

impl FallbackChainInvoker {
    pub fn new(
        backends: Vec<Arc<dyn InferenceBackend>>,
        config: Arc<RwLock<OrchestratorConfig>>,
        bus: EventBus,
    ) -> Self {
        let max_concurrent = config.read().fallback.max_concurrent_invocations;
        Self {
            backends,
            config,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            bus,
        }
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn backends(&self) -> &[Arc<dyn InferenceBackend>] {
        &self.backends
    }

    /// Run one logical inference call through the chain.
    pub async fn invoke(
        &self,
        prompt: &str,
        options: &InvocationOptions,
    ) -> Result<InvocationOutcome, FallbackError> {
        if self.backends.is_empty() {
            return Err(FallbackError::NoBackends);
        }

        let (max_retries, retry_delay_ms, latency_target_ms) = {
            let config = self.config.read();
            (
                config.fallback.max_retries,
                config.fallback.retry_delay_ms,
                config.fallback.latency_target_ms,
            )
        };

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FallbackError::Exhausted {
                attempts: 0,
                last_error: "invocation semaphore closed".to_string(),
            })?;

        let started = Instant::now();
        let preferred = self.backends[0].name().to_string();
        let mut fell_back = false;
        let mut total_attempts = 0u32;
        let mut last_error = String::new();

        for (index, backend) in self.backends.iter().enumerate() {
            if index > 0 && !fell_back {
                fell_back = true;
                warn!(
                    from = %preferred,
                    to = backend.name(),
                    "falling back from preferred inference backend"
                );
                self.bus.publish_inference_event(InferenceEvent::FellBack {
                    from_backend: preferred.clone(),
                    to_backend: backend.name().to_string(),
                    fell_back_at: Utc::now(),
                });
            }

            if !backend.probe_available().await {
                warn!(backend = backend.name(), "backend unavailable, skipping");
                last_error = format!("{}: unavailable", backend.name());
                continue;
            }

            for attempt in 1..=max_retries {
                total_attempts += 1;
                let attempt_started = Instant::now();

                match backend.invoke(prompt, options).await {
                    Ok(text) => {
                        let elapsed = started.elapsed();
                        info!(
                            backend = backend.name(),
                            attempt,
                            elapsed_ms = attempt_started.elapsed().as_millis() as u64,
                            "inference attempt succeeded"
                        );
                        self.check_latency_target(elapsed, latency_target_ms);
                        return Ok(InvocationOutcome {
                            text,
                            backend: backend.name().to_string(),
                            elapsed,
                            attempts: total_attempts,
                        });
                    }
                    Err(e) => {
                        let elapsed_ms = attempt_started.elapsed().as_millis() as u64;
                        warn!(
                            backend = backend.name(),
                            attempt,
                            max_retries,
                            elapsed_ms,
                            error = %e,
                            "inference attempt failed"
                        );
                        self.bus.publish_inference_event(InferenceEvent::AttemptFailed {
                            backend: backend.name().to_string(),
                            attempt,
                            reason: e.to_string(),
                            elapsed_ms,
                            failed_at: Utc::now(),
                        });
                        last_error = format!("{}: {}", backend.name(), e);

                        if attempt < max_retries {
                            let delay = retry_delay_ms.saturating_mul(1 << (attempt - 1));
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                        }
                    }
                }
            }
        }

        self.check_latency_target(started.elapsed(), latency_target_ms);

        if last_error.is_empty() {
            last_error = "no backend was available".to_string();
        }
        Err(FallbackError::Exhausted {
            attempts: total_attempts,
            last_error,
        })
    }

    fn check_latency_target(&self, elapsed: Duration, target_ms: u64) {
        let elapsed_ms = elapsed.as_millis() as u64;
        if elapsed_ms > target_ms {
            warn!(elapsed_ms, target_ms, "inference latency target exceeded");
            self.bus
                .publish_inference_event(InferenceEvent::LatencyTargetExceeded {
                    elapsed_ms,
                    target_ms,
                    exceeded_at: Utc::now(),
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backend::BackendError;
    use crate::infrastructure::event_bus::CoordinationEvent;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Test backend that replays a scripted sequence of outcomes.
    struct ScriptedBackend {
        name: String,
        available: bool,
        outcomes: Mutex<VecDeque<Result<String, String>>>,
        invocations: AtomicU32,
        delay: Duration,
    }

    impl ScriptedBackend {
        fn new(name: &str, available: bool, outcomes: Vec<Result<String, String>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                available,
                outcomes: Mutex::new(outcomes.into()),
                invocations: AtomicU32::new(0),
                delay: Duration::ZERO,
            })
        }

        fn with_delay(name: &str, delay: Duration, outcomes: Vec<Result<String, String>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                available: true,
                outcomes: Mutex::new(outcomes.into()),
                invocations: AtomicU32::new(0),
                delay,
            })
        }

        fn invocations(&self) -> u32 {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceBackend for ScriptedBackend {
        fn name(&self) -> &str {
            &self.name
        }

        async fn probe_available(&self) -> bool {
            self.available
        }

        async fn invoke(&self, _: &str, _: &InvocationOptions) -> Result<String, BackendError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(reason)) => Err(BackendError::Provider(reason)),
                None => Err(BackendError::Provider("script exhausted".to_string())),
            }
        }
    }

    fn invoker(backends: Vec<Arc<dyn InferenceBackend>>) -> FallbackChainInvoker {
        FallbackChainInvoker::new(
            backends,
            Arc::new(RwLock::new(OrchestratorConfig::default())),
            EventBus::with_default_capacity(),
        )
    }

    #[tokio::test]
    async fn test_preferred_backend_wins_when_healthy() {
        let local = ScriptedBackend::new("local", true, vec![Ok("done".to_string())]);
        let remote = ScriptedBackend::new("remote-managed", true, vec![Ok("never".to_string())]);
        let invoker = invoker(vec![local.clone(), remote.clone()]);

        let outcome = invoker
            .invoke("prompt", &InvocationOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.text, "done");
        assert_eq!(outcome.backend, "local");
        assert_eq!(outcome.attempts, 1);
        assert_eq!(remote.invocations(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_preferred_falls_back_to_next() {
        let local = ScriptedBackend::new("local", false, vec![]);
        let remote = ScriptedBackend::new("remote-managed", true, vec![Ok("done".to_string())]);
        let invoker = invoker(vec![local.clone(), remote]);
        let mut events = invoker.bus.subscribe();

        let outcome = invoker
            .invoke("prompt", &InvocationOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.backend, "remote-managed");
        assert_eq!(local.invocations(), 0);

        // A fell-back warning event was emitted for the escalation.
        let mut saw_fallback = false;
        while let Ok(event) = events.try_recv() {
            if matches!(
                event,
                CoordinationEvent::Inference(InferenceEvent::FellBack { .. })
            ) {
                saw_fallback = true;
            }
        }
        assert!(saw_fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_backend_retried_before_escalation() {
        let local = ScriptedBackend::new(
            "local",
            true,
            vec![
                Err("boom".to_string()),
                Err("boom".to_string()),
                Err("boom".to_string()),
            ],
        );
        let remote = ScriptedBackend::new("remote-managed", true, vec![Ok("done".to_string())]);
        let invoker = invoker(vec![local.clone(), remote.clone()]);

        let outcome = invoker
            .invoke("prompt", &InvocationOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.backend, "remote-managed");
        // Same backend retried to its budget before moving on.
        assert_eq!(local.invocations(), 3);
        assert_eq!(outcome.attempts, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_aggregates_last_error() {
        let local = ScriptedBackend::new("local", true, vec![]);
        let remote = ScriptedBackend::new("remote-managed", true, vec![]);
        let invoker = invoker(vec![local, remote]);

        let err = invoker
            .invoke("prompt", &InvocationOptions::default())
            .await
            .unwrap_err();
        match err {
            FallbackError::Exhausted { attempts, last_error } => {
                assert_eq!(attempts, 6);
                assert!(last_error.contains("remote-managed"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_no_backends_is_a_distinct_error() {
        let invoker = invoker(vec![]);
        let err = invoker
            .invoke("prompt", &InvocationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FallbackError::NoBackends));
    }

    #[tokio::test]
    async fn test_latency_overrun_is_signal_not_error() {
        let local = ScriptedBackend::with_delay(
            "local",
            Duration::from_millis(10),
            vec![Ok("done".to_string())],
        );
        let config = Arc::new(RwLock::new(OrchestratorConfig::default()));
        config.write().fallback.latency_target_ms = 1;
        let invoker =
            FallbackChainInvoker::new(vec![local], config, EventBus::with_default_capacity());
        let mut events = invoker.bus.subscribe();

        let outcome = invoker.invoke("prompt", &InvocationOptions::default()).await;
        assert!(outcome.is_ok());

        let mut saw_overrun = false;
        while let Ok(event) = events.try_recv() {
            if matches!(
                event,
                CoordinationEvent::Inference(InferenceEvent::LatencyTargetExceeded { .. })
            ) {
                saw_overrun = true;
            }
        }
        assert!(saw_overrun);
    }
}
