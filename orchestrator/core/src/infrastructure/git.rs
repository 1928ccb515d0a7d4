// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Git source synchronization for checkout-based backends.
//!
//! Works against an existing checkout only. Nothing is cloned and a failed
//! step is not undone.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::domain::progress::ProgressSink;
use crate::domain::provider::{ProviderError, SourceAcquisition};
use crate::domain::runtime::{CommandRunner, CommandSpec, SyncError};
use crate::domain::service::ManagedService;

pub struct SourceSync {
    runner: Arc<dyn CommandRunner>,
}

impl SourceSync {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Fetch, check out `branch` and pull it in `dir`, stopping at the first
    /// failed step.
    pub async fn sync(&self, dir: &Path, branch: &str, sink: &dyn ProgressSink) -> Result<(), SyncError> {
        if dir.as_os_str().is_empty() {
            return Err(SyncError::MissingWorkingDir);
        }

        info!(dir = %dir.display(), branch = %branch, "Synchronizing checkout");

        let steps: [(&'static str, Vec<&str>); 3] = [
            ("Fetching", vec!["fetch", "--all"]),
            ("Checking out", vec!["checkout", branch]),
            ("Pulling", vec!["pull", "origin", branch]),
        ];

        for (step, args) in steps {
            sink.write_line(&format!("▸ {}...", step)).await?;
            let command = CommandSpec::new("git").args(args).current_dir(dir);
            self.runner
                .stream(&command, sink)
                .await
                .map_err(|source| SyncError::Step { step, source })?;
        }

        Ok(())
    }
}

#[async_trait]
impl SourceAcquisition for SourceSync {
    async fn acquire(
        &self,
        service: &ManagedService,
        _reference: &str,
        sink: &dyn ProgressSink,
    ) -> Result<(), ProviderError> {
        self.sync(&service.path, &service.update.branch, sink).await?;
        Ok(())
    }
}
