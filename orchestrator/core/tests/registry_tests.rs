// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Registry and lifecycle facade tests with stub providers and stores.

mod common;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{MemorySink, ScriptedRunner};
use osservatore_core::application::lifecycle::{LifecycleError, ServiceAction, ServiceLifecycle};
use osservatore_core::application::registry::{RegistryError, ServiceRegistry};
use osservatore_core::domain::progress::ProgressSink;
use osservatore_core::domain::provider::{ProviderError, ServiceProvider};
use osservatore_core::domain::repository::{RepositoryError, ServiceRepository};
use osservatore_core::domain::runtime::ExecError;
use osservatore_core::domain::service::{
    BackendKind, ManagedService, ServiceId, ServiceStatus, UpdateSpec,
};
use osservatore_core::infrastructure::providers::{ProviderMap, SystemdProvider};
use osservatore_core::infrastructure::repositories::{
    InMemoryServiceRepository, JsonFileServiceRepository,
};

/// Provider answering every probe with a fixed status, or failing for the
/// ids listed in `broken`.
struct StubProvider {
    kind: BackendKind,
    status: ServiceStatus,
    broken: Vec<String>,
    probe_delay: Duration,
}

impl StubProvider {
    fn new(kind: BackendKind, status: ServiceStatus) -> Self {
        Self {
            kind,
            status,
            broken: Vec::new(),
            probe_delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl ServiceProvider for StubProvider {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn start(&self, _service: &ManagedService) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn stop(&self, _service: &ManagedService) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn restart(&self, _service: &ManagedService) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn status(&self, service: &ManagedService) -> Result<ServiceStatus, ProviderError> {
        if !self.probe_delay.is_zero() {
            tokio::time::sleep(self.probe_delay).await;
        }
        if self.broken.iter().any(|id| id == service.id.as_str()) {
            return Err(ProviderError::Probe {
                service: service.id.to_string(),
                source: ExecError::Failed {
                    command: format!("inspect {}", service.id),
                    status: "exit code 125".to_string(),
                    detail: "no such container".to_string(),
                },
            });
        }
        Ok(self.status)
    }

    async fn logs(&self, _service: &ManagedService) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["ok".to_string()])
    }

    async fn update(&self, _service: &ManagedService, sink: &dyn ProgressSink) -> Result<(), ProviderError> {
        sink.write_line("stub update").await?;
        Ok(())
    }
}

/// Store that counts saves and can be told to fail them.
#[derive(Default)]
struct CountingStore {
    saves: AtomicUsize,
    fail: bool,
}

impl ServiceRepository for CountingStore {
    fn load(&self) -> Result<Vec<ManagedService>, RepositoryError> {
        Ok(Vec::new())
    }

    fn save(&self, _services: &[ManagedService]) -> Result<(), RepositoryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RepositoryError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            )));
        }
        Ok(())
    }
}

fn providers(list: Vec<Arc<dyn ServiceProvider>>) -> ProviderMap {
    list.into_iter().map(|p| (p.kind(), p)).collect()
}

fn running_systemd() -> ProviderMap {
    providers(vec![Arc::new(StubProvider::new(
        BackendKind::Systemd,
        ServiceStatus::Running,
    ))])
}

fn unit(id: &str) -> ManagedService {
    ManagedService::new(id, id.to_uppercase(), BackendKind::Systemd)
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let registry = ServiceRegistry::open(Arc::new(InMemoryServiceRepository::new()), running_systemd())
        .expect("open registry");

    registry.upsert(unit("api")).unwrap();
    registry.upsert(unit("api")).unwrap();
    registry.upsert(unit("web")).unwrap();

    let services = registry.list().await;
    assert_eq!(services.len(), 2);
    assert_eq!(services.iter().filter(|s| s.id.as_str() == "api").count(), 1);
}

#[tokio::test]
async fn test_upsert_replaces_whole_entity() {
    let store = InMemoryServiceRepository::new();
    let registry = ServiceRegistry::open(Arc::new(store.clone()), running_systemd()).unwrap();

    let mut first = unit("api");
    first.description = "old".to_string();
    registry.upsert(first).unwrap();

    let mut second = unit("api");
    second.name = "Public API".to_string();
    registry.upsert(second).unwrap();

    let stored = store.snapshot();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Public API");
    assert_eq!(stored[0].description, "");
}

#[tokio::test]
async fn test_blank_id_is_rejected() {
    let store = Arc::new(CountingStore::default());
    let registry = ServiceRegistry::open(store.clone(), running_systemd()).unwrap();

    let err = registry.upsert(unit("  ")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidService(_)));
    assert!(registry.is_empty());
    assert_eq!(store.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delete_absent_id_is_noop() {
    let store = Arc::new(CountingStore::default());
    let registry = ServiceRegistry::open(store.clone(), running_systemd()).unwrap();
    registry.upsert(unit("api")).unwrap();

    registry.delete(&ServiceId::new("missing")).expect("absent delete succeeds");

    assert_eq!(registry.len(), 1);
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_removes_and_persists() {
    let store = InMemoryServiceRepository::new();
    let registry = ServiceRegistry::open(Arc::new(store.clone()), running_systemd()).unwrap();
    registry.upsert(unit("api")).unwrap();
    registry.upsert(unit("web")).unwrap();

    registry.delete(&ServiceId::new("api")).unwrap();

    let ids: Vec<String> = store.snapshot().into_iter().map(|s| s.id.0).collect();
    assert_eq!(ids, vec!["web"]);
}

#[tokio::test]
async fn test_list_overwrites_stored_status() {
    let registry = ServiceRegistry::open(Arc::new(InMemoryServiceRepository::new()), running_systemd()).unwrap();
    let mut service = unit("api");
    service.status = ServiceStatus::Error;
    registry.upsert(service).unwrap();

    let listed = registry.list().await;
    assert_eq!(listed[0].status, ServiceStatus::Running);

    // The probed status is not written back.
    assert_eq!(registry.find(&ServiceId::new("api")).unwrap().status, ServiceStatus::Error);
}

#[tokio::test]
async fn test_probe_failure_keeps_last_known_status() {
    let mut podman = StubProvider::new(BackendKind::Podman, ServiceStatus::Running);
    podman.broken = vec!["db".to_string()];
    let registry = ServiceRegistry::open(
        Arc::new(InMemoryServiceRepository::new()),
        providers(vec![Arc::new(podman)]),
    )
    .unwrap();

    let mut db = ManagedService::new("db", "DB", BackendKind::Podman);
    db.status = ServiceStatus::Stopped;
    registry.upsert(db).unwrap();
    registry.upsert(ManagedService::new("cache", "Cache", BackendKind::Podman)).unwrap();

    let listed = registry.list().await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].status, ServiceStatus::Stopped);
    assert_eq!(listed[1].status, ServiceStatus::Running);
}

#[tokio::test]
async fn test_kind_without_provider_keeps_stored_status() {
    let registry = ServiceRegistry::open(Arc::new(InMemoryServiceRepository::new()), running_systemd()).unwrap();
    let mut app = ManagedService::new("web", "Web", BackendKind::Pm2);
    app.status = ServiceStatus::Updating;
    registry.upsert(app).unwrap();

    let listed = registry.list().await;
    assert_eq!(listed[0].status, ServiceStatus::Updating);
    assert!(matches!(
        registry.resolve_provider(BackendKind::Pm2),
        Err(RegistryError::ProviderNotFound(BackendKind::Pm2))
    ));
}

#[tokio::test]
async fn test_persistence_failure_keeps_in_memory_entity() {
    let store = Arc::new(CountingStore {
        fail: true,
        ..Default::default()
    });
    let registry = ServiceRegistry::open(store, running_systemd()).unwrap();

    let err = registry.upsert(unit("api")).unwrap_err();
    assert!(matches!(err, RegistryError::Persistence(_)));

    let listed = registry.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id.as_str(), "api");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_list_and_upsert() {
    let mut slow = StubProvider::new(BackendKind::Systemd, ServiceStatus::Running);
    slow.probe_delay = Duration::from_millis(5);
    let registry = Arc::new(
        ServiceRegistry::open(
            Arc::new(InMemoryServiceRepository::new()),
            providers(vec![Arc::new(slow)]),
        )
        .unwrap(),
    );
    for id in ["a", "b", "c"] {
        registry.upsert(unit(id)).unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..20 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                registry.upsert(unit(&format!("svc-{}", i))).unwrap();
                registry.upsert(unit("a")).unwrap();
            } else {
                let listed = registry.list().await;
                for id in ["a", "b", "c"] {
                    assert_eq!(listed.iter().filter(|s| s.id.as_str() == id).count(), 1);
                }
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }

    let listed = registry.list().await;
    assert_eq!(listed.len(), 13);
}

#[tokio::test]
async fn test_registry_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("services.json");

    {
        let registry = ServiceRegistry::open(
            Arc::new(JsonFileServiceRepository::new(&path)),
            running_systemd(),
        )
        .unwrap();
        registry.upsert(unit("api").with_path("/srv/api")).unwrap();
    }

    let registry = ServiceRegistry::open(Arc::new(JsonFileServiceRepository::new(&path)), running_systemd()).unwrap();
    let service = registry.get(&ServiceId::new("api")).await.unwrap();
    assert_eq!(service.path, std::path::PathBuf::from("/srv/api"));
    assert_eq!(service.status, ServiceStatus::Running);
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let registry = ServiceRegistry::open(Arc::new(InMemoryServiceRepository::new()), running_systemd()).unwrap();
    assert!(matches!(
        registry.get(&ServiceId::new("ghost")).await,
        Err(RegistryError::ServiceNotFound(_))
    ));
}

#[tokio::test]
async fn test_lifecycle_distinguishes_not_found_cases() {
    let registry = Arc::new(
        ServiceRegistry::open(Arc::new(InMemoryServiceRepository::new()), running_systemd()).unwrap(),
    );
    registry.upsert(ManagedService::new("web", "Web", BackendKind::Pm2)).unwrap();
    let lifecycle = ServiceLifecycle::new(registry);

    let err = lifecycle
        .perform(&ServiceId::new("ghost"), ServiceAction::Start)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::ServiceNotFound(_)));

    let err = lifecycle
        .perform(&ServiceId::new("web"), ServiceAction::Start)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::ProviderNotFound(BackendKind::Pm2)));
}

#[tokio::test]
async fn test_lifecycle_drives_real_provider() {
    let runner = Arc::new(ScriptedRunner::new());
    let mut map: HashMap<BackendKind, Arc<dyn ServiceProvider>> = HashMap::new();
    map.insert(BackendKind::Systemd, Arc::new(SystemdProvider::new(runner.clone())));
    let registry = Arc::new(ServiceRegistry::open(Arc::new(InMemoryServiceRepository::new()), map).unwrap());
    registry.upsert(unit("api")).unwrap();
    let lifecycle = ServiceLifecycle::new(registry);

    lifecycle.perform(&ServiceId::new("api"), ServiceAction::Restart).await.unwrap();
    let sink = MemorySink::new();
    lifecycle.deploy(&ServiceId::new("api"), &sink).await.unwrap();

    assert_eq!(
        runner.commands(),
        vec!["systemctl restart api", "systemctl restart api"]
    );
    let lines = sink.lines();
    assert_eq!(lines[0], "Starting Systemd update for API");
    assert_eq!(lines.last().map(String::as_str), Some("Deployment Successful!"));
}

#[tokio::test]
async fn test_deploy_failure_ends_with_error_text() {
    let runner = Arc::new(ScriptedRunner::new().fail("make build"));
    let mut map: HashMap<BackendKind, Arc<dyn ServiceProvider>> = HashMap::new();
    map.insert(BackendKind::Systemd, Arc::new(SystemdProvider::new(runner.clone())));
    let registry = Arc::new(ServiceRegistry::open(Arc::new(InMemoryServiceRepository::new()), map).unwrap());
    let update = UpdateSpec {
        build_command: "make build".to_string(),
        ..Default::default()
    };
    registry.upsert(unit("api").with_update(update)).unwrap();
    let lifecycle = ServiceLifecycle::new(registry);

    let sink = MemorySink::new();
    let err = lifecycle.deploy(&ServiceId::new("api"), &sink).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Provider(_)));

    let lines = sink.lines();
    let last = lines.last().expect("terminal line");
    assert!(last.starts_with("Deployment Failed: "), "got {last}");
    assert!(last.contains("make build"));
    assert!(!sink.contains("Deployment Successful!"));
    assert!(!runner.commands().contains(&"systemctl restart api".to_string()));
}

#[tokio::test]
async fn test_deploy_reports_unresolvable_targets() {
    let registry = Arc::new(
        ServiceRegistry::open(Arc::new(InMemoryServiceRepository::new()), running_systemd()).unwrap(),
    );
    registry.upsert(ManagedService::new("web", "Web", BackendKind::Pm2)).unwrap();
    let lifecycle = ServiceLifecycle::new(registry);

    let sink = MemorySink::new();
    let err = lifecycle.deploy(&ServiceId::new("ghost"), &sink).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ServiceNotFound(_)));
    assert_eq!(sink.lines(), vec!["Error: Service not found"]);

    let sink = MemorySink::new();
    let err = lifecycle.deploy(&ServiceId::new("web"), &sink).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ProviderNotFound(BackendKind::Pm2)));
    assert_eq!(sink.lines(), vec!["Error: Provider not found"]);
}
