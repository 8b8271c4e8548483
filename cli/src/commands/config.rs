// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use nexus_orchestrator_core::domain::config::OrchestratorConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration
    Show,
    /// Validate the configuration and exit
    Validate,
}

pub fn run(config: OrchestratorConfig, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let yaml = serde_yaml::to_string(&config).context("rendering configuration")?;
            print!("{}", yaml);
            Ok(())
        }
        ConfigCommand::Validate => {
            config.validate()?;
            println!("{}", "configuration is valid".green());
            Ok(())
        }
    }
}
