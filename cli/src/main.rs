// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

//! # Nexus Orchestrator CLI
//!
//! The `nexus` binary drives a delegation orchestrator from the command
//! line: register the agent pool from a YAML manifest, delegate tasks, and
//! inspect configuration and backend health.
//!
//! ## Commands
//!
//! - `nexus delegate <description>` - Delegate a task through the pipeline
//! - `nexus agents` - List the configured agent pool
//! - `nexus backends` - Probe configured inference backends
//! - `nexus config show|validate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nexus_orchestrator_core::domain::config::OrchestratorConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{BackendsCommand, ConfigCommand, DelegateArgs};

/// Nexus delegation orchestrator - route tasks across a swarm of agents
#[derive(Parser)]
#[command(name = "nexus")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "NEXUS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "NEXUS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delegate a task to the agent pool
    Delegate(DelegateArgs),

    /// List the configured agent pool
    Agents,

    /// Probe the configured inference backends
    Backends(BackendsCommand),

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Delegate(args) => commands::delegate::run(config, args).await,
        Commands::Agents => commands::agents::run(config),
        Commands::Backends(args) => commands::backends::run(config, args).await,
        Commands::Config { command } => commands::config::run(config, command),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<OrchestratorConfig> {
    match path {
        Some(path) => OrchestratorConfig::from_yaml_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => {
            let default = PathBuf::from("nexus.yaml");
            if default.exists() {
                OrchestratorConfig::from_yaml_file(&default)
                    .context("loading configuration from ./nexus.yaml")
            } else {
                Ok(OrchestratorConfig::default())
            }
        }
    }
}
