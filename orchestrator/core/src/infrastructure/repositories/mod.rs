// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the [`ServiceRepository`] abstraction
//! defined in the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve the managed-service collection
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **JsonFileServiceRepository** - pretty-printed JSON array, rewritten atomically
//! - **InMemoryServiceRepository** - ephemeral storage for tests and dry runs

use parking_lot::RwLock;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::domain::repository::{RepositoryError, ServiceRepository};
use crate::domain::service::ManagedService;

pub struct JsonFileServiceRepository {
    path: PathBuf,
}

impl JsonFileServiceRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ServiceRepository for JsonFileServiceRepository {
    fn load(&self) -> Result<Vec<ManagedService>, RepositoryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Registry file not found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Files written by a registry that was never populated hold `null`.
        let services: Option<Vec<ManagedService>> = serde_json::from_str(&content)?;
        Ok(services.unwrap_or_default())
    }

    fn save(&self, services: &[ManagedService]) -> Result<(), RepositoryError> {
        let data = serde_json::to_vec_pretty(services)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        file.write_all(&data)?;
        file.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }

        file.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), count = services.len(), "Registry persisted");
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryServiceRepository {
    services: Arc<RwLock<Vec<ManagedService>>>,
}

impl InMemoryServiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(services: Vec<ManagedService>) -> Self {
        Self {
            services: Arc::new(RwLock::new(services)),
        }
    }

    /// What the last `save` stored.
    pub fn snapshot(&self) -> Vec<ManagedService> {
        self.services.read().clone()
    }
}

impl ServiceRepository for InMemoryServiceRepository {
    fn load(&self) -> Result<Vec<ManagedService>, RepositoryError> {
        Ok(self.services.read().clone())
    }

    fn save(&self, services: &[ManagedService]) -> Result<(), RepositoryError> {
        *self.services.write() = services.to_vec();
        Ok(())
    }
}
