// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Context Handoff Manager
//!
//! Serializes, compresses, stores, and later retrieves a task's context
//! exactly once per handoff id. The manager exclusively owns stored blobs
//! for their lifetime; a blob is removed on completion or cancellation and
//! never retained after consumption.

use crate::domain::agent::AgentId;
use crate::domain::codec::{CompressionOptions, CompressionQuality, ContextCodec};
use crate::domain::events::HandoffEvent;
use crate::domain::handoff::{
    ContextHandoffRequest, ContextHandoffResponse, ContextMap, HandoffError, HandoffId,
    HandoffStatus, TransferMetadata,
};
use crate::domain::task::TaskId;
use crate::infrastructure::event_bus::EventBus;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

struct StoredHandoff {
    target_agent_id: AgentId,
    task_id: TaskId,
    compressed: Vec<u8>,
    metadata: TransferMetadata,
}

pub struct ContextHandoffManager {
    codec: Arc<dyn ContextCodec>,
    blobs: DashMap<HandoffId, StoredHandoff>,
    statuses: DashMap<HandoffId, HandoffStatus>,
    bus: EventBus,
}

impl ContextHandoffManager {
    pub fn new(codec: Arc<dyn ContextCodec>, bus: EventBus) -> Self {
        Self {
            codec,
            blobs: DashMap::new(),
            statuses: DashMap::new(),
            bus,
        }
    }

    /// Compress and store a context payload for later pickup by the target.
    pub async fn initiate_handoff(
        &self,
        request: ContextHandoffRequest,
    ) -> Result<ContextHandoffResponse, HandoffError> {
        request.validate()?;

        let handoff_id = HandoffId::new();
        self.statuses.insert(handoff_id, HandoffStatus::Pending);

        match self.compress_and_store(handoff_id, &request).await {
            Ok(response) => {
                self.statuses.insert(handoff_id, HandoffStatus::Transferring);
                self.bus.publish_handoff_event(HandoffEvent::Initiated {
                    handoff_id,
                    task_id: request.task_id.clone(),
                    source_agent_id: request.source_agent_id.clone(),
                    target_agent_id: request.target_agent_id.clone(),
                    raw_bytes: response.raw_bytes,
                    compressed_bytes: response.compressed_bytes,
                    initiated_at: Utc::now(),
                });
                info!(
                    %handoff_id,
                    task_id = %request.task_id,
                    raw_bytes = response.raw_bytes,
                    compressed_bytes = response.compressed_bytes,
                    "handoff initiated"
                );
                Ok(response)
            }
            Err(e) => {
                self.fail(handoff_id, &e);
                Err(e)
            }
        }
    }

    async fn compress_and_store(
        &self,
        handoff_id: HandoffId,
        request: &ContextHandoffRequest,
    ) -> Result<ContextHandoffResponse, HandoffError> {
        let serialized = serde_json::to_string(&request.context)?;
        let quality = CompressionQuality::for_priority(request.priority);
        let started = Instant::now();

        let compressed = self
            .codec
            .compress(&serialized, &CompressionOptions::for_handoff(quality))
            .await?;

        let metadata = TransferMetadata {
            raw_bytes: serialized.len() as u64,
            compressed_bytes: compressed.len() as u64,
            quality,
            compression_ms: started.elapsed().as_millis() as u64,
            compressed_at: Utc::now(),
        };

        let response = ContextHandoffResponse {
            handoff_id,
            raw_bytes: metadata.raw_bytes,
            compressed_bytes: metadata.compressed_bytes,
        };

        self.blobs.insert(
            handoff_id,
            StoredHandoff {
                target_agent_id: request.target_agent_id.clone(),
                task_id: request.task_id.clone(),
                compressed,
                metadata,
            },
        );

        Ok(response)
    }

    /// Deliver the stored context to its target, consuming the blob.
    ///
    /// Only the original target agent may complete a handoff; a wrong-target
    /// call is rejected without consuming anything. A second completion of
    /// the same id fails because the blob is already gone.
    pub async fn complete_handoff(
        &self,
        handoff_id: HandoffId,
        target_agent_id: &AgentId,
    ) -> Result<ContextMap, HandoffError> {
        {
            let stored = self
                .blobs
                .get(&handoff_id)
                .ok_or(HandoffError::NotFound(handoff_id))?;
            if stored.target_agent_id != *target_agent_id {
                return Err(HandoffError::WrongTarget {
                    handoff_id,
                    expected: stored.target_agent_id.clone(),
                    got: target_agent_id.clone(),
                });
            }
        }

        // Atomic removal makes consumption at-most-once even under
        // concurrent completion attempts.
        let (_, stored) = self
            .blobs
            .remove(&handoff_id)
            .ok_or(HandoffError::NotFound(handoff_id))?;

        match self.decompress_and_parse(&stored).await {
            Ok(context) => {
                self.statuses.insert(handoff_id, HandoffStatus::Completed);
                self.bus.publish_handoff_event(HandoffEvent::Completed {
                    handoff_id,
                    target_agent_id: target_agent_id.clone(),
                    completed_at: Utc::now(),
                });
                debug!(%handoff_id, task_id = %stored.task_id, "handoff completed");
                Ok(context)
            }
            Err(e) => {
                self.fail(handoff_id, &e);
                Err(e)
            }
        }
    }

    async fn decompress_and_parse(&self, stored: &StoredHandoff) -> Result<ContextMap, HandoffError> {
        let serialized = self.codec.decompress(&stored.compressed).await?;
        let context: ContextMap = serde_json::from_str(&serialized)?;
        Ok(context)
    }

    /// Drop all state for a handoff. Returns true only if the id existed.
    pub fn cancel_handoff(&self, handoff_id: HandoffId) -> bool {
        let had_blob = self.blobs.remove(&handoff_id).is_some();
        let had_status = self.statuses.remove(&handoff_id).is_some();
        let existed = had_blob || had_status;

        if existed {
            self.bus.publish_handoff_event(HandoffEvent::Cancelled {
                handoff_id,
                cancelled_at: Utc::now(),
            });
            info!(%handoff_id, "handoff cancelled");
        }
        existed
    }

    /// Current lifecycle status, retained after completion or failure.
    pub fn status(&self, handoff_id: HandoffId) -> Option<HandoffStatus> {
        self.statuses.get(&handoff_id).map(|s| *s)
    }

    /// Transfer metadata for a handoff whose blob is still stored.
    pub fn transfer_metadata(&self, handoff_id: HandoffId) -> Option<TransferMetadata> {
        self.blobs.get(&handoff_id).map(|s| s.metadata.clone())
    }

    pub fn pending_count(&self) -> usize {
        self.blobs.len()
    }

    fn fail(&self, handoff_id: HandoffId, err: &HandoffError) {
        self.statuses.insert(handoff_id, HandoffStatus::Failed);
        self.bus.publish_handoff_event(HandoffEvent::Failed {
            handoff_id,
            reason: err.to_string(),
            failed_at: Utc::now(),
        });
        error!(%handoff_id, error = %err, "handoff failed");
    }
}
