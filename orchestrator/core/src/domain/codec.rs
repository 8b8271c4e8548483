// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

// Context Codec Domain Interface (Anti-Corruption Layer)
//
// Abstracts the compression backend used to shrink handoff payloads.
// Implementations in infrastructure/codec/ directory.

use crate::domain::task::TaskPriority;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compression effort level. Higher effort trades latency for size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionQuality {
    /// Fast, low compression. Used for high-priority handoffs.
    Fast,
    /// Default trade-off.
    Balanced,
    /// Slow, maximum compression. Used for low-priority handoffs.
    Max,
}

impl CompressionQuality {
    /// High-priority handoffs must move quickly; low-priority ones can spend
    /// time compressing harder.
    pub fn for_priority(priority: TaskPriority) -> Self {
        match priority {
            TaskPriority::High => Self::Fast,
            TaskPriority::Medium => Self::Balanced,
            TaskPriority::Low => Self::Max,
        }
    }
}

/// Options passed to a codec alongside the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionOptions {
    pub quality: CompressionQuality,
    pub preserve_semantic: bool,
    pub context_type: String,
}

impl CompressionOptions {
    pub fn for_handoff(quality: CompressionQuality) -> Self {
        Self {
            quality,
            preserve_semantic: true,
            context_type: "task-context".to_string(),
        }
    }
}

/// Domain interface for context compression backends.
#[async_trait]
pub trait ContextCodec: Send + Sync {
    async fn compress(&self, text: &str, options: &CompressionOptions) -> Result<Vec<u8>, CodecError>;

    async fn decompress(&self, bytes: &[u8]) -> Result<String, CodecError>;
}

/// Errors that can occur during codec operations.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compression failed: {0}")]
    Compression(String),

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("payload is not valid for this codec: {0}")]
    InvalidPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_follows_priority() {
        assert_eq!(
            CompressionQuality::for_priority(TaskPriority::High),
            CompressionQuality::Fast
        );
        assert_eq!(
            CompressionQuality::for_priority(TaskPriority::Medium),
            CompressionQuality::Balanced
        );
        assert_eq!(
            CompressionQuality::for_priority(TaskPriority::Low),
            CompressionQuality::Max
        );
    }
}
