// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Deploy Pipeline
//!
//! The update procedure shared by every provider:
//!
//! ```text
//! announce → pre-update hooks → source acquisition → build → post-update hooks → restart
//! ```
//!
//! Stages run strictly in order, each at most once. The first failure ends
//! the run and is returned unchanged; side effects of completed stages stay
//! in place. Providers differ only in the [`SourceAcquisition`] strategy and
//! the wording of the restart notice.
//!
//! The pipeline holds no registry lock. Two concurrent runs for the same
//! service are not serialized here.

use std::path::Path;
use tracing::{info, warn};

use crate::domain::progress::ProgressSink;
use crate::domain::provider::{ProviderError, ServiceProvider, SourceAcquisition};
use crate::domain::runtime::{CommandRunner, CommandSpec};
use crate::domain::service::ManagedService;

pub struct DeployPipeline<'a> {
    runner: &'a dyn CommandRunner,
    source: &'a dyn SourceAcquisition,
    restart_notice: &'static str,
}

impl<'a> DeployPipeline<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        source: &'a dyn SourceAcquisition,
        restart_notice: &'static str,
    ) -> Self {
        Self {
            runner,
            source,
            restart_notice,
        }
    }

    pub async fn run(
        &self,
        provider: &dyn ServiceProvider,
        service: &ManagedService,
        sink: &dyn ProgressSink,
    ) -> Result<(), ProviderError> {
        info!(service_id = %service.id, kind = %service.kind, "Starting deploy pipeline");

        let result = self.execute(provider, service, sink).await;
        match &result {
            Ok(()) => info!(service_id = %service.id, "Deploy pipeline finished"),
            Err(e) => warn!(service_id = %service.id, error = %e, "Deploy pipeline failed"),
        }
        result
    }

    async fn execute(
        &self,
        provider: &dyn ServiceProvider,
        service: &ManagedService,
        sink: &dyn ProgressSink,
    ) -> Result<(), ProviderError> {
        let update = &service.update;

        sink.write_line(&format!(
            "Starting {} update for {}",
            provider.kind().display_name(),
            service.display_name()
        ))
        .await?;

        self.run_commands(&service.path, &update.pre_update, sink).await?;

        if let Some(reference) = update.source_reference() {
            self.source.acquire(service, reference, sink).await?;
        }

        if let Some(build) = update.build_step() {
            sink.write_line("Building...").await?;
            self.run_command(&service.path, build, sink).await?;
        }

        self.run_commands(&service.path, &update.post_update, sink).await?;

        sink.write_line(self.restart_notice).await?;
        provider.restart(service).await
    }

    async fn run_commands(
        &self,
        dir: &Path,
        commands: &[String],
        sink: &dyn ProgressSink,
    ) -> Result<(), ProviderError> {
        for line in commands {
            self.run_command(dir, line, sink).await?;
        }
        Ok(())
    }

    /// Blank lines are skipped without a progress line.
    async fn run_command(&self, dir: &Path, line: &str, sink: &dyn ProgressSink) -> Result<(), ProviderError> {
        let Some(command) = CommandSpec::from_command_line(line, dir) else {
            return Ok(());
        };
        sink.write_line(&format!("▸ Executing: {}", line.trim())).await?;
        self.runner.stream(&command, sink).await?;
        Ok(())
    }
}
