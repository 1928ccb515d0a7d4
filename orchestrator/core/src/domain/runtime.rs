// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # External Command Runtime
//!
//! Contract for running the backend CLIs (`systemctl`, `pm2`, `podman`,
//! `git`, hook commands). Implemented in `crate::infrastructure::runtime`.
//!
//! Two modes:
//! - `stream`: combined stdout/stderr forwarded line by line to a
//!   [`ProgressSink`] while the child runs. Used by the deploy pipeline.
//! - `capture`: output collected and returned once the child exits. Used by
//!   lifecycle actions, status probes and log tails.
//!
//! Neither mode retries and neither imposes a timeout.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::progress::{ProgressSink, SinkError};

/// Program, argument vector and working directory of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir`. An empty path leaves the working directory inherited.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.working_dir = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir.to_path_buf())
        };
        self
    }

    /// Split a hook command line on whitespace. No shell is involved, so
    /// quoting, pipes and variable expansion are not interpreted.
    /// Returns `None` for a blank line.
    pub fn from_command_line(line: &str, dir: &Path) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).args(parts).current_dir(dir))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Collected result of a captured command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Turn a non-zero exit into [`ExecError::Failed`] attributed to `command`.
    pub fn check(self, command: &CommandSpec) -> Result<Self, ExecError> {
        if self.success {
            return Ok(self);
        }
        Err(ExecError::Failed {
            command: command.to_string(),
            status: describe_exit(self.code),
            detail: self.stderr.trim().to_string(),
        })
    }
}

/// Human-readable exit description ("exit code 1", "terminated by signal").
pub fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("command `{command}` failed ({status}){}", detail_suffix(.detail))]
    Failed {
        command: String,
        status: String,
        detail: String,
    },

    #[error("output of `{command}` could not be delivered: {source}")]
    Sink {
        command: String,
        #[source]
        source: SinkError,
    },
}

impl ExecError {
    /// The command line this failure is attributed to.
    pub fn command(&self) -> &str {
        match self {
            ExecError::Spawn { command, .. }
            | ExecError::Failed { command, .. }
            | ExecError::Sink { command, .. } => command,
        }
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail)
    }
}

/// Version-control sync failures. A failed step leaves the checkout as git
/// left it; nothing is rolled back.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("repo path is empty")]
    MissingWorkingDir,

    #[error("git {step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: ExecError,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion, forwarding every output line to `sink` as it is
    /// produced. Fails if the command cannot start, exits non-zero, or the
    /// sink stops accepting lines (the child is killed in that case).
    async fn stream(&self, command: &CommandSpec, sink: &dyn ProgressSink) -> Result<(), ExecError>;

    /// Run to completion and collect output. A non-zero exit is reported
    /// through [`CommandOutput::success`], not as an error.
    async fn capture(&self, command: &CommandSpec) -> Result<CommandOutput, ExecError>;
}
