// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lifecycle use cases: resolve a service and its provider, then act.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::application::registry::{RegistryError, ServiceRegistry};
use crate::domain::progress::ProgressSink;
use crate::domain::provider::{ProviderError, ServiceProvider};
use crate::domain::service::{BackendKind, ManagedService, ServiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ServiceAction::Start),
            "stop" => Ok(ServiceAction::Stop),
            "restart" => Ok(ServiceAction::Restart),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("service not found: {0}")]
    ServiceNotFound(ServiceId),

    #[error("provider not found for backend '{0}'")]
    ProviderNotFound(BackendKind),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for LifecycleError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::ServiceNotFound(id) => LifecycleError::ServiceNotFound(id),
            RegistryError::ProviderNotFound(kind) => LifecycleError::ProviderNotFound(kind),
            other => LifecycleError::Registry(other),
        }
    }
}

#[derive(Clone)]
pub struct ServiceLifecycle {
    registry: Arc<ServiceRegistry>,
}

impl ServiceLifecycle {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Stored service plus the provider for its kind. Neither the lookup nor
    /// the returned handles hold a registry lock.
    pub fn resolve(&self, id: &ServiceId) -> Result<(ManagedService, Arc<dyn ServiceProvider>), LifecycleError> {
        let service = self.registry.find(id)?;
        let provider = self.registry.resolve_provider(service.kind)?;
        Ok((service, provider))
    }

    pub async fn perform(&self, id: &ServiceId, action: ServiceAction) -> Result<(), LifecycleError> {
        let (service, provider) = self.resolve(id)?;
        info!(service_id = %id, action = %action, "Lifecycle action requested");
        match action {
            ServiceAction::Start => provider.start(&service).await?,
            ServiceAction::Stop => provider.stop(&service).await?,
            ServiceAction::Restart => provider.restart(&service).await?,
        }
        Ok(())
    }

    pub async fn logs(&self, id: &ServiceId) -> Result<Vec<String>, LifecycleError> {
        let (service, provider) = self.resolve(id)?;
        Ok(provider.logs(&service).await?)
    }

    /// Run the update pipeline for `id`, streaming progress to `sink`.
    ///
    /// The last line written always tells the outcome: `Deployment
    /// Successful!`, `Deployment Failed: <error>`, or an `Error: ...` line
    /// when the service or its provider cannot be resolved. Writes of that
    /// line are best effort since the sink may be the reason for the failure.
    pub async fn deploy(&self, id: &ServiceId, sink: &dyn ProgressSink) -> Result<(), LifecycleError> {
        let (service, provider) = match self.resolve(id) {
            Ok(resolved) => resolved,
            Err(e) => {
                let message = match &e {
                    LifecycleError::ServiceNotFound(_) => "Error: Service not found".to_string(),
                    LifecycleError::ProviderNotFound(_) => "Error: Provider not found".to_string(),
                    other => format!("Error: {}", other),
                };
                sink.write_line(&message).await.ok();
                return Err(e);
            }
        };

        info!(service_id = %id, "Deployment started");
        match provider.update(&service, sink).await {
            Ok(()) => {
                info!(service_id = %id, "Deployment succeeded");
                sink.write_line("Deployment Successful!").await.ok();
                Ok(())
            }
            Err(e) => {
                error!(service_id = %id, error = %e, "Deployment failed");
                sink.write_line(&format!("Deployment Failed: {}", e)).await.ok();
                Err(e.into())
            }
        }
    }
}
