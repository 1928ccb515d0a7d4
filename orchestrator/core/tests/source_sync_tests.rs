// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Git source synchronization against a scripted runner.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{MemorySink, ScriptedRunner};
use osservatore_core::domain::runtime::SyncError;
use osservatore_core::infrastructure::git::SourceSync;

#[tokio::test]
async fn test_sync_runs_three_steps_in_order() {
    let runner = Arc::new(ScriptedRunner::new().prints("git fetch --all", &["Fetching origin"]));
    let sync = SourceSync::new(runner.clone());
    let sink = MemorySink::new();

    sync.sync(Path::new("/srv/api"), "main", &sink)
        .await
        .expect("sync should succeed");

    assert_eq!(
        runner.commands(),
        vec!["git fetch --all", "git checkout main", "git pull origin main"]
    );
    assert!(runner
        .calls()
        .iter()
        .all(|c| c.working_dir.as_deref() == Some(Path::new("/srv/api"))));
    assert_eq!(
        sink.lines(),
        vec![
            "▸ Fetching...",
            "Fetching origin",
            "▸ Checking out...",
            "▸ Pulling...",
        ]
    );
}

#[tokio::test]
async fn test_fetch_failure_skips_checkout_and_pull() {
    let runner = Arc::new(ScriptedRunner::new().fail("git fetch --all"));
    let sync = SourceSync::new(runner.clone());
    let sink = MemorySink::new();

    let err = sync
        .sync(Path::new("/srv/api"), "main", &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Step { step: "Fetching", .. }));
    assert_eq!(runner.commands(), vec!["git fetch --all"]);
    assert!(!sink.contains("Checking out"));
}

#[tokio::test]
async fn test_checkout_failure_skips_pull() {
    let runner = Arc::new(ScriptedRunner::new().fail("git checkout release"));
    let sync = SourceSync::new(runner.clone());
    let sink = MemorySink::new();

    let err = sync
        .sync(Path::new("/srv/api"), "release", &sink)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("git checkout release"));
    assert_eq!(runner.commands(), vec!["git fetch --all", "git checkout release"]);
    assert!(!sink.contains("Pulling"));
}

#[tokio::test]
async fn test_empty_working_dir_runs_nothing() {
    let runner = Arc::new(ScriptedRunner::new());
    let sync = SourceSync::new(runner.clone());
    let sink = MemorySink::new();

    let err = sync.sync(Path::new(""), "main", &sink).await.unwrap_err();

    assert!(matches!(err, SyncError::MissingWorkingDir));
    assert_eq!(err.to_string(), "repo path is empty");
    assert!(runner.commands().is_empty());
    assert!(sink.lines().is_empty());
}
