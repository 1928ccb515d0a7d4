// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the osservatore CLI

pub mod config;
pub mod service;

pub use self::config::ConfigCommand;
pub use self::service::ServiceCommand;
