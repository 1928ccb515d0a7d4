// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Process Runner
//!
//! [`CommandRunner`] implementation over `tokio::process`.
//!
//! In streaming mode stdout and stderr are read by two reader tasks and merged
//! through one channel, so the sink sees lines in roughly the order the child
//! produced them. Lines are decoded lossily; a backend printing invalid UTF-8
//! never aborts a deploy.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::progress::ProgressSink;
use crate::domain::runtime::{describe_exit, CommandOutput, CommandRunner, CommandSpec, ExecError};

/// Buffered lines between the reader tasks and the sink.
const LINE_BUFFER: usize = 256;

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

fn spawn_line_reader<R>(reader: R, tx: mpsc::Sender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "Output stream closed with error");
                    break;
                }
            }
        }
    })
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn stream(&self, command: &CommandSpec, sink: &dyn ProgressSink) -> Result<(), ExecError> {
        let rendered = command.to_string();
        debug!(command = %rendered, dir = ?command.working_dir, "Spawning command");

        let mut child = Self::command(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::Spawn {
                command: rendered.clone(),
                reason: e.to_string(),
            })?;

        let (tx, mut rx) = mpsc::channel(LINE_BUFFER);
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, tx.clone()));
        }
        drop(tx);

        while let Some(line) = rx.recv().await {
            if let Err(source) = sink.write_line(&line).await {
                warn!(command = %rendered, error = %source, "Progress sink rejected output, killing child");
                child.kill().await.ok();
                for reader in readers {
                    reader.abort();
                }
                return Err(ExecError::Sink {
                    command: rendered,
                    source,
                });
            }
        }

        let status = child.wait().await.map_err(|e| ExecError::Spawn {
            command: rendered.clone(),
            reason: format!("wait failed: {}", e),
        })?;

        if status.success() {
            debug!(command = %rendered, "Command finished");
            Ok(())
        } else {
            Err(ExecError::Failed {
                command: rendered,
                status: describe_exit(status.code()),
                detail: String::new(),
            })
        }
    }

    async fn capture(&self, command: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let rendered = command.to_string();
        debug!(command = %rendered, dir = ?command.working_dir, "Running command");

        let output = Self::command(command)
            .output()
            .await
            .map_err(|e| ExecError::Spawn {
                command: rendered,
                reason: e.to_string(),
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
