// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Embedded mode execution
//!
//! Opens the configured registry file in-process and runs service commands
//! directly against the real providers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Arc;

use osservatore_core::{
    application::{ServiceLifecycle, ServiceRegistry},
    domain::{
        node_config::NodeConfig,
        progress::{ProgressSink, SinkError},
    },
    infrastructure::{
        default_providers, repositories::JsonFileServiceRepository, ProcessRunner,
    },
};

pub struct EmbeddedExecutor {
    lifecycle: ServiceLifecycle,
}

impl EmbeddedExecutor {
    pub fn new(config: &NodeConfig) -> Result<Self> {
        let registry_path = &config.spec.registry.path;
        let store = Arc::new(JsonFileServiceRepository::new(registry_path));
        let providers = default_providers(Arc::new(ProcessRunner::new()));
        let registry = ServiceRegistry::open(store, providers)
            .with_context(|| format!("Failed to open registry at {}", registry_path.display()))?;

        Ok(Self {
            lifecycle: ServiceLifecycle::new(Arc::new(registry)),
        })
    }

    pub fn lifecycle(&self) -> &ServiceLifecycle {
        &self.lifecycle
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        self.lifecycle.registry()
    }
}

/// Progress sink printing each line to stdout as it arrives.
///
/// A closed stdout (e.g. `osservatore service update api | head -1`) is
/// reported as a sink error so the running pipeline stops.
pub struct ConsoleSink;

#[async_trait]
impl ProgressSink for ConsoleSink {
    async fn write_line(&self, line: &str) -> Result<(), SinkError> {
        write_progress_line(&mut std::io::stdout().lock(), line)
    }
}

fn write_progress_line(out: &mut impl Write, line: &str) -> Result<(), SinkError> {
    let rendered = if line.starts_with('▸') {
        line.cyan()
    } else if line.starts_with("Deployment Successful") {
        line.green().bold()
    } else if line.starts_with("Deployment Failed") || line.starts_with("Error:") {
        line.red().bold()
    } else {
        line.normal()
    };

    writeln!(out, "{}", rendered)
        .and_then(|()| out.flush())
        .map_err(|e| match e.kind() {
            io::ErrorKind::BrokenPipe => SinkError::Closed,
            _ => SinkError::Write(e.to_string()),
        })
}
