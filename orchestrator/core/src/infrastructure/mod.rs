// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

pub mod backends;
pub mod codec;
pub mod event_bus;
pub mod route_cache;

pub use event_bus::{CoordinationEvent, EventBus, EventBusError, EventReceiver};
pub use route_cache::FastPathRouteCache;
