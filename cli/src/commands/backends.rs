// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use nexus_orchestrator_core::domain::config::OrchestratorConfig;
use nexus_orchestrator_core::infrastructure::backends;

#[derive(Args)]
pub struct BackendsCommand {
    /// Probe each backend for availability
    #[arg(long)]
    pub check: bool,
}

pub async fn run(config: OrchestratorConfig, args: BackendsCommand) -> Result<()> {
    if config.backends.is_empty() {
        println!("{}", "no backends configured".yellow());
        return Ok(());
    }

    if !args.check {
        for backend in &config.backends {
            println!(
                "{}  {}  {}  {}",
                backend.name.cyan().bold(),
                backend.backend_type,
                backend.endpoint.dimmed(),
                if backend.enabled {
                    "enabled".normal()
                } else {
                    "disabled".yellow()
                }
            );
        }
        return Ok(());
    }

    let pool = backends::from_config(&config.backends).context("building inference backends")?;
    let health = backends::health_check_all(&pool).await;

    let mut names: Vec<&String> = health.keys().collect();
    names.sort_unstable();
    for name in names {
        let status = if health[name] {
            "available".green()
        } else {
            "unavailable".red()
        };
        println!("{}  {}", name.cyan().bold(), status);
    }
    Ok(())
}
