// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Service Repository Interface
//!
//! Durable storage for the managed-service collection. The registry keeps the
//! authoritative copy in memory and hands the whole collection to `save` on
//! every mutation; implementations rewrite, never append.
//!
//! | Implementation | Backing |
//! |----------------|---------|
//! | `JsonFileServiceRepository` | pretty-printed JSON array on disk |
//! | `InMemoryServiceRepository` | process memory (tests, dry runs) |
//!
//! The trait is synchronous: `save` runs while the registry holds its write
//! lock, so persistence is serialized with every other mutation.

use crate::domain::service::ManagedService;

pub trait ServiceRepository: Send + Sync {
    /// Load the full collection. A store that does not exist yet is empty.
    fn load(&self) -> Result<Vec<ManagedService>, RepositoryError>;

    /// Replace the stored collection with `services`.
    fn save(&self, services: &[ManagedService]) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
