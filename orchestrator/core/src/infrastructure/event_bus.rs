// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Coordination Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Publishing is fire-and-forget: the core never blocks waiting on a
// subscriber, and events are dropped when no receiver keeps up.
//
// In-memory only; events are lost on restart.

use crate::domain::events::{DelegationEvent, HandoffEvent, HandshakeEvent, InferenceEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Unified coordination event type for the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinationEvent {
    Handshake(HandshakeEvent),
    Handoff(HandoffEvent),
    Inference(InferenceEvent),
    Delegation(DelegationEvent),
}

/// Event bus for publishing and subscribing to coordination events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<CoordinationEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity. Capacity
    /// bounds how many events can be buffered before old ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create an event bus with default capacity (1024).
    pub fn with_default_capacity() -> Self {
        Self::new(1024)
    }

    pub fn publish_handshake_event(&self, event: HandshakeEvent) {
        self.publish(CoordinationEvent::Handshake(event));
    }

    pub fn publish_handoff_event(&self, event: HandoffEvent) {
        self.publish(CoordinationEvent::Handoff(event));
    }

    pub fn publish_inference_event(&self, event: InferenceEvent) {
        self.publish(CoordinationEvent::Inference(event));
    }

    pub fn publish_delegation_event(&self, event: DelegationEvent) {
        self.publish(CoordinationEvent::Delegation(event));
    }

    /// Publish an event to all subscribers, fire-and-forget.
    fn publish(&self, event: CoordinationEvent) {
        debug!("Publishing event: {:?}", event);

        // send() returns the number of receivers; zero subscribers is fine.
        let receiver_count = self.sender.send(event).unwrap_or(0);

        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all coordination events.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Receiver for coordination events.
pub struct EventReceiver {
    receiver: broadcast::Receiver<CoordinationEvent>,
}

impl EventReceiver {
    /// Receive the next event, waiting until one is available.
    pub async fn recv(&mut self) -> Result<CoordinationEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without waiting.
    pub fn try_recv(&mut self) -> Result<CoordinationEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Errors that can occur when receiving events.
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}
