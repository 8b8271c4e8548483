// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Nexus Orchestrator Core
//!
//! Coordinates delegation of tasks among a pool of swarm agents backed by
//! local or remote inference backends. A delegation flows through a fixed
//! pipeline: fast-path route lookup, agent handshake, compressed context
//! handoff, then inference with backend fallback.
//!
//! # Architecture
//!
//! - **domain**: types, interfaces, and errors shared by all components.
//! - **application**: the handshake mediator, context handoff manager,
//!   consensus selector, fallback-chain invoker, and delegation orchestrator.
//! - **infrastructure**: event bus, context codec, backend adapters, and
//!   the fast-path route cache.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
