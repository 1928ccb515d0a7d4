// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain model and contracts.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Managed-service aggregate, provider/runner/sink contracts,
//!   repository interface and node configuration

pub mod node_config;
pub mod progress;
pub mod provider;
pub mod repository;
pub mod runtime;
pub mod service;
