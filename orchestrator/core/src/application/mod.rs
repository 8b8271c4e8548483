// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

pub mod consensus;
pub mod fallback;
pub mod handoff_manager;
pub mod handshake_mediator;
pub mod orchestrator;

// Re-export services for convenience
pub use consensus::ConsensusCoordinator;
pub use fallback::{FallbackChainInvoker, FallbackError, InvocationOutcome};
pub use handoff_manager::ContextHandoffManager;
pub use handshake_mediator::HandshakeMediator;
pub use orchestrator::DelegationOrchestrator;
