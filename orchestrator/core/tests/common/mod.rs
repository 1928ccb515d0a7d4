// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared test doubles: a scripted command runner and recording sinks.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use osservatore_core::domain::progress::{ProgressSink, SinkError};
use osservatore_core::domain::runtime::{
    describe_exit, CommandOutput, CommandRunner, CommandSpec, ExecError,
};

/// Runner that never spawns anything. Commands are matched by their rendered
/// form, e.g. `git checkout main`.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<CommandSpec>>,
    failing: Mutex<HashSet<String>>,
    unstartable: Mutex<HashSet<String>>,
    streamed: Mutex<HashMap<String, Vec<String>>>,
    captured: Mutex<HashMap<String, String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` exits with status 1.
    pub fn fail(self, command: &str) -> Self {
        self.failing.lock().insert(command.to_string());
        self
    }

    /// `command` cannot be spawned.
    pub fn unstartable(self, command: &str) -> Self {
        self.unstartable.lock().insert(command.to_string());
        self
    }

    /// Lines `command` prints when streamed.
    pub fn prints(self, command: &str, lines: &[&str]) -> Self {
        self.streamed
            .lock()
            .insert(command.to_string(), lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Stdout `command` returns when captured.
    pub fn outputs(self, command: &str, stdout: &str) -> Self {
        self.captured.lock().insert(command.to_string(), stdout.to_string());
        self
    }

    /// Rendered command lines, in invocation order.
    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.to_string()).collect()
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    fn record(&self, command: &CommandSpec) -> String {
        self.calls.lock().push(command.clone());
        command.to_string()
    }

    fn spawn_error(rendered: &str) -> ExecError {
        ExecError::Spawn {
            command: rendered.to_string(),
            reason: "No such file or directory (os error 2)".to_string(),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn stream(&self, command: &CommandSpec, sink: &dyn ProgressSink) -> Result<(), ExecError> {
        let rendered = self.record(command);
        if self.unstartable.lock().contains(&rendered) {
            return Err(Self::spawn_error(&rendered));
        }

        let lines = self.streamed.lock().get(&rendered).cloned().unwrap_or_default();
        for line in lines {
            sink.write_line(&line).await.map_err(|source| ExecError::Sink {
                command: rendered.clone(),
                source,
            })?;
        }

        if self.failing.lock().contains(&rendered) {
            return Err(ExecError::Failed {
                command: rendered,
                status: describe_exit(Some(1)),
                detail: String::new(),
            });
        }
        Ok(())
    }

    async fn capture(&self, command: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let rendered = self.record(command);
        if self.unstartable.lock().contains(&rendered) {
            return Err(Self::spawn_error(&rendered));
        }

        let stdout = self.captured.lock().get(&rendered).cloned().unwrap_or_default();
        let failed = self.failing.lock().contains(&rendered);
        Ok(CommandOutput {
            success: !failed,
            code: Some(if failed { 1 } else { 0 }),
            stdout,
            stderr: if failed { "scripted failure".to_string() } else { String::new() },
        })
    }
}

/// Sink that keeps every line.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

#[async_trait]
impl ProgressSink for MemorySink {
    async fn write_line(&self, line: &str) -> Result<(), SinkError> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
}

/// Sink that accepts `capacity` lines, then reports itself closed.
pub struct ClosingSink {
    capacity: usize,
    written: AtomicUsize,
}

impl ClosingSink {
    pub fn after(capacity: usize) -> Self {
        Self {
            capacity,
            written: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProgressSink for ClosingSink {
    async fn write_line(&self, _line: &str) -> Result<(), SinkError> {
        if self.written.fetch_add(1, Ordering::SeqCst) >= self.capacity {
            return Err(SinkError::Closed);
        }
        Ok(())
    }
}
