// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Osservatore CLI
//!
//! The `osservatore` binary runs the control-plane HTTP daemon and manages
//! the service registry from the terminal.
//!
//! ## Commands
//!
//! - `osservatore serve` - Run the HTTP daemon in the foreground
//! - `osservatore service list|add|remove|start|stop|restart|logs|update` - Service operations
//! - `osservatore config show|validate|generate` - Configuration management
//!
//! Service commands run in embedded mode: the registry file named by the
//! configuration is opened in-process.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use osservatore_cli::commands::{self, ConfigCommand, ServiceCommand};
use osservatore_cli::daemon;
use osservatore_core::domain::node_config::NodeConfig;

/// Osservatore - supervise systemd units, pm2 apps and containers
#[derive(Parser)]
#[command(name = "osservatore")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "OSSERVATORE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(long, global = true, env = "OSSERVATORE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP daemon in the foreground
    #[command(name = "serve")]
    Serve {
        /// Bind address (default: from configuration)
        #[arg(long)]
        host: Option<String>,

        /// HTTP port (default: from configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Managed service operations
    #[command(name = "service")]
    Service {
        #[command(subcommand)]
        command: ServiceCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    match command {
        Commands::Serve { host, port } => {
            let config = load_config(cli.config, cli.log_level.as_deref())?;
            daemon::start_server(config, host, port).await
        }
        Commands::Service { command } => {
            let config = load_config(cli.config, cli.log_level.as_deref())?;
            commands::service::handle_command(command, &config).await
        }
        Commands::Config { command } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
            commands::config::handle_command(command, cli.config).await
        }
    }
}

/// Load and validate the node configuration, then start logging with its
/// settings. An explicit `--log-level` wins over the configured level.
fn load_config(path: Option<PathBuf>, log_level: Option<&str>) -> Result<NodeConfig> {
    let config = NodeConfig::load_or_default(path).context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let logging = &config.spec.observability.logging;
    init_logging(log_level.unwrap_or(&logging.level), &logging.format)?;
    Ok(config)
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
