// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use colored::Colorize;
use nexus_orchestrator_core::domain::config::OrchestratorConfig;

pub fn run(config: OrchestratorConfig) -> Result<()> {
    if config.agents.is_empty() {
        println!("{}", "no agents configured".yellow());
        return Ok(());
    }

    for agent in &config.agents {
        let mut capabilities: Vec<&str> = agent.capabilities.iter().map(String::as_str).collect();
        capabilities.sort_unstable();

        println!(
            "{}  {}  [{}]  {}/{}  {}",
            agent.id.to_string().cyan().bold(),
            agent.name,
            agent.agent_type,
            agent.workload,
            agent.capacity,
            if agent.is_local {
                "local".green()
            } else {
                "remote".normal()
            }
        );
        if !capabilities.is_empty() {
            println!("    capabilities: {}", capabilities.join(", ").dimmed());
        }
    }
    Ok(())
}
