// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP daemon
//!
//! Runs in the foreground; process supervision is left to the host's init
//! system.

pub mod server;

pub use server::start_server;
