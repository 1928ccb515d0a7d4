// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Container Provider
//!
//! Containers managed through a docker-compatible CLI. `podman` and `docker`
//! accept the same argument vectors, so one provider serves both; the
//! [`ContainerEngine`] only selects the binary and the backend kind.
//!
//! Unlike systemd, a failed `inspect` is surfaced as a
//! [`ProviderError::Probe`]: a container that cannot be inspected is usually
//! misconfigured, not merely stopped.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{run_checked, split_lines};
use crate::application::deploy::DeployPipeline;
use crate::domain::progress::ProgressSink;
use crate::domain::provider::{ProviderError, ServiceProvider, SourceAcquisition};
use crate::domain::runtime::{CommandRunner, CommandSpec};
use crate::domain::service::{BackendKind, ManagedService, ServiceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEngine {
    Podman,
    Docker,
}

impl ContainerEngine {
    pub fn binary(&self) -> &'static str {
        match self {
            ContainerEngine::Podman => "podman",
            ContainerEngine::Docker => "docker",
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            ContainerEngine::Podman => BackendKind::Podman,
            ContainerEngine::Docker => BackendKind::Docker,
        }
    }
}

/// Source acquisition for containers: pull the configured image reference.
pub struct ImagePull {
    runner: Arc<dyn CommandRunner>,
    engine: ContainerEngine,
}

impl ImagePull {
    pub fn new(runner: Arc<dyn CommandRunner>, engine: ContainerEngine) -> Self {
        Self { runner, engine }
    }
}

#[async_trait]
impl SourceAcquisition for ImagePull {
    async fn acquire(
        &self,
        _service: &ManagedService,
        reference: &str,
        sink: &dyn ProgressSink,
    ) -> Result<(), ProviderError> {
        sink.write_line(&format!("Pulling image: {}", reference)).await?;
        let command = CommandSpec::new(self.engine.binary()).args(["pull", reference]);
        self.runner.stream(&command, sink).await?;
        Ok(())
    }
}

pub struct ContainerProvider {
    runner: Arc<dyn CommandRunner>,
    engine: ContainerEngine,
    source: ImagePull,
}

impl ContainerProvider {
    pub fn new(runner: Arc<dyn CommandRunner>, engine: ContainerEngine) -> Self {
        Self {
            source: ImagePull::new(runner.clone(), engine),
            runner,
            engine,
        }
    }

    fn engine_command<'a, I>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = &'a str>,
    {
        CommandSpec::new(self.engine.binary()).args(args)
    }

    async fn control(&self, verb: &str, service: &ManagedService) -> Result<(), ProviderError> {
        info!(service_id = %service.id, engine = self.engine.binary(), action = verb, "Container action");
        run_checked(self.runner.as_ref(), &self.engine_command([verb, service.id.as_str()])).await?;
        Ok(())
    }
}

#[async_trait]
impl ServiceProvider for ContainerProvider {
    fn kind(&self) -> BackendKind {
        self.engine.kind()
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

    async fn status(&self, service: &ManagedService) -> Result<ServiceStatus, ProviderError> {
        let command = self.engine_command(["inspect", service.id.as_str(), "--format", "{{.State.Status}}"]);
        let output = run_checked(self.runner.as_ref(), &command)
            .await
            .map_err(|source| ProviderError::Probe {
                service: service.id.to_string(),
                source,
            })?;

        if output.stdout.trim() == "running" {
            Ok(ServiceStatus::Running)
        } else {
            Ok(ServiceStatus::Stopped)
        }
    }

    async fn logs(&self, service: &ManagedService) -> Result<Vec<String>, ProviderError> {
        let command = self.engine_command(["logs", "--tail", "100", service.id.as_str()]);
        let output = run_checked(self.runner.as_ref(), &command).await?;
        Ok(split_lines(&output.stdout))
    }

    async fn update(&self, service: &ManagedService, sink: &dyn ProgressSink) -> Result<(), ProviderError> {
        DeployPipeline::new(self.runner.as_ref(), &self.source, "Restarting container...")
            .run(self, service, sink)
            .await
    }
}
