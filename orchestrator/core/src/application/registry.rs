// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Service Registry
//!
//! Owns the managed-service collection and the provider set. One instance is
//! shared by handle with every request handler.
//!
//! ## Locking
//!
//! The collection sits behind a single `parking_lot::RwLock`. Reads hold the
//! read lock only while copying the collection; the per-service status probes
//! run after the guard is dropped, so a listing can interleave with a
//! mutation. Mutations hold the write lock across the repository `save`, which
//! serializes persistence with every other access. No guard is ever held
//! across an `.await`.
//!
//! ## Persistence
//!
//! Every mutation rewrites the whole collection. When `save` fails the
//! in-memory change is kept and the error is returned; the two copies stay
//! divergent until the next successful mutation.

use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::provider::ServiceProvider;
use crate::domain::repository::{RepositoryError, ServiceRepository};
use crate::domain::service::{BackendKind, ManagedService, ServiceId};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service not found: {0}")]
    ServiceNotFound(ServiceId),

    #[error("no provider registered for backend '{0}'")]
    ProviderNotFound(BackendKind),

    #[error("invalid service: {0}")]
    InvalidService(String),

    #[error("failed to persist registry: {0}")]
    Persistence(#[from] RepositoryError),
}

pub struct ServiceRegistry {
    services: RwLock<Vec<ManagedService>>,
    store: Arc<dyn ServiceRepository>,
    providers: HashMap<BackendKind, Arc<dyn ServiceProvider>>,
}

impl ServiceRegistry {
    /// Load the collection from `store`. A store with nothing in it yet
    /// yields an empty registry.
    pub fn open(
        store: Arc<dyn ServiceRepository>,
        providers: HashMap<BackendKind, Arc<dyn ServiceProvider>>,
    ) -> Result<Self, RegistryError> {
        let services = store.load()?;
        info!(
            services = services.len(),
            providers = providers.len(),
            "Service registry loaded"
        );
        Ok(Self {
            services: RwLock::new(services),
            store,
            providers,
        })
    }

    /// Every service, in stored order, with its status freshly probed.
    pub async fn list(&self) -> Vec<ManagedService> {
        let snapshot = self.services.read().clone();
        join_all(snapshot.into_iter().map(|service| self.probe(service))).await
    }

    /// One service with its status freshly probed.
    pub async fn get(&self, id: &ServiceId) -> Result<ManagedService, RegistryError> {
        let service = self.find(id)?;
        Ok(self.probe(service).await)
    }

    /// Stored copy of one service. No probe.
    pub fn find(&self, id: &ServiceId) -> Result<ManagedService, RegistryError> {
        self.services
            .read()
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| RegistryError::ServiceNotFound(id.clone()))
    }

    /// Insert `service`, replacing any entry with the same id, then persist.
    pub fn upsert(&self, service: ManagedService) -> Result<(), RegistryError> {
        if service.id.is_blank() {
            return Err(RegistryError::InvalidService("id must not be empty".to_string()));
        }

        let mut services = self.services.write();
        let id = service.id.clone();
        match services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => *existing = service,
            None => services.push(service),
        }
        info!(service_id = %id, "Service registered");
        self.store.save(&services)?;
        Ok(())
    }

    /// Remove the service with `id`. Removing an absent id succeeds and
    /// leaves the store untouched.
    pub fn delete(&self, id: &ServiceId) -> Result<(), RegistryError> {
        let mut services = self.services.write();
        let before = services.len();
        services.retain(|s| &s.id != id);
        if services.len() == before {
            debug!(service_id = %id, "Delete of unknown service ignored");
            return Ok(());
        }
        info!(service_id = %id, "Service removed");
        self.store.save(&services)?;
        Ok(())
    }

    pub fn resolve_provider(&self, kind: BackendKind) -> Result<Arc<dyn ServiceProvider>, RegistryError> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or(RegistryError::ProviderNotFound(kind))
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Overwrite `service.status` with the provider's answer. A missing
    /// provider or a failed probe keeps the stored status.
    async fn probe(&self, mut service: ManagedService) -> ManagedService {
        let Some(provider) = self.providers.get(&service.kind) else {
            return service;
        };
        match provider.status(&service).await {
            Ok(status) => service.status = status,
            Err(e) => warn!(
                service_id = %service.id,
                error = %e,
                "Status probe failed, keeping last known status"
            ),
        }
        service
    }
}
