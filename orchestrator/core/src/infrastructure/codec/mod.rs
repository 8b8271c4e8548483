// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

pub mod deflate;

pub use deflate::DeflateContextCodec;
