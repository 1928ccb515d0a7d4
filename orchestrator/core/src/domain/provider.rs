// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Service Provider Contract
//!
//! One implementation per [`BackendKind`], selected by kind at runtime. Every
//! provider maps the same lifecycle onto its backend CLI:
//!
//! | Operation | systemd | pm2 | podman / docker |
//! |-----------|---------|-----|-----------------|
//! | start/stop/restart | `systemctl <op> <id>` | `pm2 <op> <id>` | `podman <op> <id>` |
//! | status | `systemctl is-active` | `pm2 jlist` | `podman inspect --format {{.State.Status}}` |
//! | logs | `journalctl -u <id> -n 100` | `pm2 logs <id> --lines 100 --nostream` | `podman logs --tail 100` |
//! | update source | git sync | git sync | image pull |
//!
//! ## Probe failure policy
//!
//! Deliberately not uniform. A failing `systemctl is-active` still answers
//! (`unknown`), because a missing unit is routine. `pm2 jlist` and
//! `podman inspect` failures are hard [`ProviderError::Probe`] errors, since a
//! missing container usually means misconfiguration.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::progress::{ProgressSink, SinkError};
use crate::domain::runtime::{ExecError, SyncError};
use crate::domain::service::{BackendKind, ManagedService, ServiceStatus};

#[async_trait]
pub trait ServiceProvider: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn start(&self, service: &ManagedService) -> Result<(), ProviderError>;

    async fn stop(&self, service: &ManagedService) -> Result<(), ProviderError>;

    async fn restart(&self, service: &ManagedService) -> Result<(), ProviderError>;

    /// Live status from the backend. Never consults `service.status`.
    async fn status(&self, service: &ManagedService) -> Result<ServiceStatus, ProviderError>;

    /// Last 100 log lines, oldest first.
    async fn logs(&self, service: &ManagedService) -> Result<Vec<String>, ProviderError>;

    /// Run the full update pipeline, streaming progress to `sink`. Returns
    /// the result of the final restart, or the first stage failure.
    async fn update(&self, service: &ManagedService, sink: &dyn ProgressSink) -> Result<(), ProviderError>;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Command(#[from] ExecError),

    #[error("status probe failed for '{service}': {source}")]
    Probe {
        service: String,
        #[source]
        source: ExecError,
    },

    #[error(transparent)]
    SourceSync(#[from] SyncError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// How a provider brings a service's source up to date before the build
/// stage: a git sync for checkout-based backends, an image pull for
/// container engines.
#[async_trait]
pub trait SourceAcquisition: Send + Sync {
    /// `reference` is the non-blank `repo_url` of the service's update settings.
    async fn acquire(
        &self,
        service: &ManagedService,
        reference: &str,
        sink: &dyn ProgressSink,
    ) -> Result<(), ProviderError>;
}
