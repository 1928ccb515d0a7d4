// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! pm2-managed apps.
//!
//! Status comes from `pm2 jlist`, a JSON array with one entry per process:
//!
//! ```json
//! [{ "name": "web", "pm2_env": { "status": "online" } }]
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{run_checked, split_lines};
use crate::application::deploy::DeployPipeline;
use crate::domain::progress::ProgressSink;
use crate::domain::provider::{ProviderError, ServiceProvider};
use crate::domain::runtime::{CommandRunner, CommandSpec};
use crate::domain::service::{BackendKind, ManagedService, ServiceStatus};
use crate::infrastructure::git::SourceSync;

pub struct Pm2Provider {
    runner: Arc<dyn CommandRunner>,
    source: SourceSync,
}

#[derive(Debug, Deserialize)]
struct ProcessEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    pm_id: Option<u64>,
    #[serde(default)]
    pm2_env: ProcessEnv,
}

impl ProcessEntry {
    /// pm2 accepts either the app name or its numeric `pm_id`.
    fn matches_id(&self, id: &str) -> bool {
        if self.name == id {
            return true;
        }
        match (self.pm_id, id.parse::<u64>()) {
            (Some(pm_id), Ok(wanted)) => pm_id == wanted,
            _ => false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProcessEnv {
    #[serde(default)]
    status: String,
}

impl Pm2Provider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            source: SourceSync::new(runner.clone()),
            runner,
        }
    }

    async fn control(&self, verb: &str, service: &ManagedService) -> Result<(), ProviderError> {
        info!(service_id = %service.id, action = verb, "pm2 app action");
        let command = CommandSpec::new("pm2").args([verb, service.id.as_str()]);
        run_checked(self.runner.as_ref(), &command).await?;
        Ok(())
    }
}

/// Classify `id` (app name or numeric `pm_id`) from a `pm2 jlist` dump.
/// Output that is not a JSON process list falls back to a plain text match
/// on the id and `online`.
pub fn classify_process_list(dump: &str, id: &str) -> ServiceStatus {
    let online = match serde_json::from_str::<Vec<ProcessEntry>>(dump) {
        Ok(entries) => entries
            .iter()
            .any(|entry| entry.matches_id(id) && entry.pm2_env.status == "online"),
        Err(_) => dump.contains(id) && dump.contains("online"),
    };

    if online {
        ServiceStatus::Running
    } else {
        ServiceStatus::Stopped
    }
}

#[async_trait]
impl ServiceProvider for Pm2Provider {
    fn kind(&self) -> BackendKind {
        BackendKind::Pm2
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
        let output = run_checked(self.runner.as_ref(), &CommandSpec::new("pm2").arg("jlist"))
            .await
            .map_err(|source| ProviderError::Probe {
                service: service.id.to_string(),
                source,
            })?;
        Ok(classify_process_list(&output.stdout, service.id.as_str()))
    }

    async fn logs(&self, service: &ManagedService) -> Result<Vec<String>, ProviderError> {
        let command =
            CommandSpec::new("pm2").args(["logs", service.id.as_str(), "--lines", "100", "--nostream"]);
        let output = run_checked(self.runner.as_ref(), &command).await?;
        Ok(split_lines(&output.stdout))
    }

    async fn update(&self, service: &ManagedService, sink: &dyn ProgressSink) -> Result<(), ProviderError> {
        DeployPipeline::new(self.runner.as_ref(), &self.source, "Restarting app...")
            .run(self, service, sink)
            .await
    }
}
