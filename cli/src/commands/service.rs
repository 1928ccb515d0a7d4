// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Managed service commands
//!
//! Commands: list, add, remove, start, stop, restart, logs, update

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::{ColoredString, Colorize};
use std::path::{Path, PathBuf};

use osservatore_core::application::ServiceAction;
use osservatore_core::domain::node_config::NodeConfig;
use osservatore_core::domain::service::{ManagedService, ServiceId, ServiceStatus};

use crate::embedded::{ConsoleSink, EmbeddedExecutor};

#[derive(Subcommand)]
pub enum ServiceCommand {
    /// List services with their live status
    List,

    /// Add or replace a service from a JSON or YAML file
    Add {
        /// Service definition file
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Remove a service from the registry
    Remove {
        /// Service identifier
        id: String,
    },

    /// Start a service
    Start {
        /// Service identifier
        id: String,
    },

    /// Stop a service
    Stop {
        /// Service identifier
        id: String,
    },

    /// Restart a service
    Restart {
        /// Service identifier
        id: String,
    },

    /// Show the last 100 log lines
    Logs {
        /// Service identifier
        id: String,
    },

    /// Run the update pipeline, streaming progress
    Update {
        /// Service identifier
        id: String,
    },
}

pub async fn handle_command(command: ServiceCommand, config: &NodeConfig) -> Result<()> {
    let executor = EmbeddedExecutor::new(config)?;

    match command {
        ServiceCommand::List => list(&executor).await,
        ServiceCommand::Add { file } => add(&executor, &file),
        ServiceCommand::Remove { id } => remove(&executor, ServiceId::new(id)),
        ServiceCommand::Start { id } => act(&executor, ServiceId::new(id), ServiceAction::Start).await,
        ServiceCommand::Stop { id } => act(&executor, ServiceId::new(id), ServiceAction::Stop).await,
        ServiceCommand::Restart { id } => {
            act(&executor, ServiceId::new(id), ServiceAction::Restart).await
        }
        ServiceCommand::Logs { id } => logs(&executor, ServiceId::new(id)).await,
        ServiceCommand::Update { id } => update(&executor, ServiceId::new(id)).await,
    }
}

async fn list(executor: &EmbeddedExecutor) -> Result<()> {
    let services = executor.registry().list().await;

    if services.is_empty() {
        println!("{}", "No services registered".dimmed());
        return Ok(());
    }

    println!(
        "{:<24} {:<24} {:<8} {}",
        "ID".bold(),
        "NAME".bold(),
        "TYPE".bold(),
        "STATUS".bold()
    );
    for service in &services {
        println!(
            "{:<24} {:<24} {:<8} {}",
            service.id.as_str(),
            service.name,
            service.kind.as_str(),
            status_label(service.status)
        );
    }

    Ok(())
}

fn status_label(status: ServiceStatus) -> ColoredString {
    match status {
        ServiceStatus::Running => status.as_str().green(),
        ServiceStatus::Stopped => status.as_str().yellow(),
        ServiceStatus::Error => status.as_str().red(),
        ServiceStatus::Updating => status.as_str().cyan(),
        ServiceStatus::Unknown => status.as_str().dimmed(),
    }
}

/// Parse a service definition. `.yaml`/`.yml` files are read as YAML,
/// everything else as JSON.
pub fn read_service_file(path: &Path) -> Result<ManagedService> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read service file {:?}", path))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let service = if is_yaml {
        serde_yaml::from_str(&content).context("Invalid service YAML")?
    } else {
        serde_json::from_str(&content).context("Invalid service JSON")?
    };
    Ok(service)
}

fn add(executor: &EmbeddedExecutor, file: &Path) -> Result<()> {
    let service = read_service_file(file)?;
    let id = service.id.clone();
    executor
        .registry()
        .upsert(service)
        .with_context(|| format!("Failed to register service '{}'", id))?;

    println!("{}", format!("✓ Service registered: {}", id).green());
    Ok(())
}

fn remove(executor: &EmbeddedExecutor, id: ServiceId) -> Result<()> {
    executor
        .registry()
        .delete(&id)
        .with_context(|| format!("Failed to remove service '{}'", id))?;

    println!("{}", format!("✓ Service removed: {}", id).green());
    Ok(())
}

async fn act(executor: &EmbeddedExecutor, id: ServiceId, action: ServiceAction) -> Result<()> {
    executor
        .lifecycle()
        .perform(&id, action)
        .await
        .with_context(|| format!("Failed to {} '{}'", action, id))?;

    println!("{}", format!("✓ {} {}", action, id).green());
    Ok(())
}

async fn logs(executor: &EmbeddedExecutor, id: ServiceId) -> Result<()> {
    let lines = executor
        .lifecycle()
        .logs(&id)
        .await
        .with_context(|| format!("Failed to read logs for '{}'", id))?;

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// The outcome line is written by the sink itself; the returned error only
/// sets the exit status.
async fn update(executor: &EmbeddedExecutor, id: ServiceId) -> Result<()> {
    executor
        .lifecycle()
        .deploy(&id, &ConsoleSink)
        .await
        .map_err(|_| anyhow::anyhow!("Update of '{}' did not complete", id))
}
