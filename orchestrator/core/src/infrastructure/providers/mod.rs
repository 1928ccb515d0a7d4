// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Service Provider Implementations
//!
//! Infrastructure adapters for the [`ServiceProvider`] contract, one per
//! backend CLI.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Map the uniform lifecycle onto `systemctl`, `pm2`, `podman` and `docker`
//! - **Pattern:** Adapter (Hexagonal Architecture), Strategy for source acquisition
//!
//! # Available Implementations
//!
//! - **SystemdProvider** - systemd units, git-synced sources
//! - **Pm2Provider** - pm2 apps, git-synced sources
//! - **ContainerProvider** - podman or docker containers, image pulls

pub mod container;
pub mod pm2;
pub mod systemd;

pub use container::{ContainerEngine, ContainerProvider, ImagePull};
pub use pm2::Pm2Provider;
pub use systemd::SystemdProvider;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::provider::ServiceProvider;
use crate::domain::runtime::{CommandOutput, CommandRunner, CommandSpec, ExecError};
use crate::domain::service::BackendKind;

/// Provider set keyed by backend kind.
pub type ProviderMap = HashMap<BackendKind, Arc<dyn ServiceProvider>>;

/// One provider for every supported backend kind, all sharing `runner`.
pub fn default_providers(runner: Arc<dyn CommandRunner>) -> ProviderMap {
    let providers: Vec<Arc<dyn ServiceProvider>> = vec![
        Arc::new(SystemdProvider::new(runner.clone())),
        Arc::new(Pm2Provider::new(runner.clone())),
        Arc::new(ContainerProvider::new(runner.clone(), ContainerEngine::Podman)),
        Arc::new(ContainerProvider::new(runner, ContainerEngine::Docker)),
    ];
    providers.into_iter().map(|p| (p.kind(), p)).collect()
}

/// Capture `command` and turn a non-zero exit into an error.
pub(crate) async fn run_checked(
    runner: &dyn CommandRunner,
    command: &CommandSpec,
) -> Result<CommandOutput, ExecError> {
    runner.capture(command).await?.check(command)
}

/// Split captured log output on line boundaries. A trailing newline leaves a
/// final empty entry.
pub(crate) fn split_lines(output: &str) -> Vec<String> {
    output.split('\n').map(str::to_string).collect()
}
