// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Osservatore core library.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Provider abstraction over systemd, pm2 and container
//!   engines, the shared deploy pipeline, and the status-probing service
//!   registry

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
