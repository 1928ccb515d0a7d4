// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Progress sink contract.
//!
//! A write-only, ordered line channel handed to every operation that reports
//! deploy progress. The transport behind it (WebSocket, terminal, buffer) is
//! the caller's choice. Once a sink rejects a write the operation feeding it
//! must stop.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("progress sink closed")]
    Closed,

    #[error("progress sink write failed: {0}")]
    Write(String),
}

#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Deliver one line of UTF-8 text, without its trailing newline.
    async fn write_line(&self, line: &str) -> Result<(), SinkError>;
}
