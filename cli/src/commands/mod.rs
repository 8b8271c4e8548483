// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

pub mod agents;
pub mod backends;
pub mod config;
pub mod delegate;

pub use backends::BackendsCommand;
pub use config::ConfigCommand;
pub use delegate::DelegateArgs;
