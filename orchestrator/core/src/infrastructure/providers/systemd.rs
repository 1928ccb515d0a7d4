// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! systemd units through `systemctl` and `journalctl`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::{run_checked, split_lines};
use crate::application::deploy::DeployPipeline;
use crate::domain::progress::ProgressSink;
use crate::domain::provider::{ProviderError, ServiceProvider};
use crate::domain::runtime::{CommandRunner, CommandSpec};
use crate::domain::service::{BackendKind, ManagedService, ServiceStatus};
use crate::infrastructure::git::SourceSync;

pub struct SystemdProvider {
    runner: Arc<dyn CommandRunner>,
    source: SourceSync,
}

impl SystemdProvider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            source: SourceSync::new(runner.clone()),
            runner,
        }
    }

    fn systemctl(verb: &str, service: &ManagedService) -> CommandSpec {
        CommandSpec::new("systemctl").args([verb, service.id.as_str()])
    }

    async fn control(&self, verb: &str, service: &ManagedService) -> Result<(), ProviderError> {
        info!(service_id = %service.id, action = verb, "systemd unit action");
        run_checked(self.runner.as_ref(), &Self::systemctl(verb, service)).await?;
        Ok(())
    }
}

/// Map `systemctl is-active` output to a status.
pub fn classify_unit_state(output: &str) -> ServiceStatus {
    match output.trim() {
        "active" => ServiceStatus::Running,
        "inactive" | "failed" => ServiceStatus::Stopped,
        _ => ServiceStatus::Unknown,
    }
}

#[async_trait]
impl ServiceProvider for SystemdProvider {
    fn kind(&self) -> BackendKind {
        BackendKind::Systemd
    }

    async fn start(&self, service: &ManagedService) -> Result<(), ProviderError> {
        self.control("start", service).await
    }

    async fn stop(&self, service: &ManagedService) -> Result<(), ProviderError> {
        self.control("stop", service).await
    }

    async fn restart(&self, service: &ManagedService) -> Result<(), ProviderError> {
        self.control("restart", service).await
    }

    /// `is-active` exits non-zero for every state but `active`, so its exit
    /// status is ignored and only the printed state is classified.
    async fn status(&self, service: &ManagedService) -> Result<ServiceStatus, ProviderError> {
        match self.runner.capture(&Self::systemctl("is-active", service)).await {
            Ok(output) => Ok(classify_unit_state(&output.stdout)),
            Err(e) => {
                debug!(service_id = %service.id, error = %e, "is-active probe did not run");
                Ok(ServiceStatus::Unknown)
            }
        }
    }

    async fn logs(&self, service: &ManagedService) -> Result<Vec<String>, ProviderError> {
        let command = CommandSpec::new("journalctl").args(["-u", service.id.as_str(), "-n", "100", "--no-pager"]);
        let output = run_checked(self.runner.as_ref(), &command).await?;
        Ok(split_lines(&output.stdout))
    }

    async fn update(&self, service: &ManagedService, sink: &dyn ProgressSink) -> Result<(), ProviderError> {
        DeployPipeline::new(self.runner.as_ref(), &self.source, "Restarting service...")
            .run(self, service, sink)
            .await
    }
}
