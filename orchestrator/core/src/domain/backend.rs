// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

// Inference Backend Domain Interface (Anti-Corruption Layer)
//
// Defines the domain interface for interchangeable inference backends.
// Prevents vendor lock-in by abstracting external model APIs.
//
// Implementations in infrastructure/backends/ directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Domain interface for an inference backend.
///
/// Backends are independently probeable for availability and independently
/// invocable with a prompt. The fallback-chain invoker drives a single
/// logical call across an ordered list of these.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Stable name used in logs, events, and fallback ordering.
    fn name(&self) -> &str;

    /// Cheap availability probe. A `false` here moves the fallback chain to
    /// the next backend without consuming a retry.
    async fn probe_available(&self) -> bool;

    /// Run one inference call, returning generated text.
    async fn invoke(&self, prompt: &str, options: &InvocationOptions) -> Result<String, BackendError>;
}

/// Options for a single inference invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Per-call network timeout in milliseconds, if the adapter supports one.
    #[serde(default, with = "duration_ms")]
    pub timeout: Option<Duration>,
}

impl Default for InvocationOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(2048),
            temperature: Some(0.7),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, ser: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_millis() as u64).serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(de)?.map(Duration::from_millis))
    }
}

/// Errors that can occur during backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("invocation timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend error: {0}")]
    Provider(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
