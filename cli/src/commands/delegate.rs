// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use nexus_orchestrator_core::application::DelegationOrchestrator;
use nexus_orchestrator_core::domain::config::OrchestratorConfig;
use nexus_orchestrator_core::domain::handoff::ContextMap;
use nexus_orchestrator_core::domain::task::{Task, TaskPriority};
use nexus_orchestrator_core::infrastructure::backends;
use nexus_orchestrator_core::infrastructure::codec::DeflateContextCodec;
use nexus_orchestrator_core::infrastructure::event_bus::EventBus;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct DelegateArgs {
    /// Task description
    pub description: String,

    /// Task identifier (defaults to a generated one)
    #[arg(long)]
    pub id: Option<String>,

    /// Task type
    #[arg(long, default_value = "general")]
    pub task_type: String,

    /// Priority: low, medium, high, or a numeric level
    #[arg(long, default_value = "medium")]
    pub priority: String,

    /// Path to a JSON file with the task context map
    #[arg(long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Stream coordination events while the delegation runs
    #[arg(long)]
    pub watch: bool,
}

pub async fn run(config: OrchestratorConfig, args: DelegateArgs) -> Result<()> {
    let backend_pool =
        backends::from_config(&config.backends).context("building inference backends")?;
    if backend_pool.is_empty() {
        anyhow::bail!("no inference backends configured; add a `backends:` section to the manifest");
    }

    let agents = config.agents.clone();
    let orchestrator = DelegationOrchestrator::new(
        config,
        Arc::new(DeflateContextCodec::new()),
        backend_pool,
        EventBus::with_default_capacity(),
    );
    for agent in agents {
        orchestrator.register_agent(agent);
    }

    let task = build_task(&args)?;
    let context = load_context(args.context.as_deref())?;

    let watcher = if args.watch {
        let mut receiver = orchestrator.event_bus().subscribe();
        Some(tokio::spawn(async move {
            while let Ok(event) = receiver.recv().await {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{} {}", "event".dimmed(), line.dimmed()),
                    Err(_) => continue,
                }
            }
        }))
    } else {
        None
    };

    let result = orchestrator.delegate_task(&task, context).await;

    if let Some(watcher) = watcher {
        watcher.abort();
    }

    if result.success {
        println!(
            "{} task {} delegated to {} in {} ms",
            "ok".green().bold(),
            result.task_id,
            result
                .delegated_to
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default()
                .cyan(),
            result.metrics.duration_ms
        );
        if let Some(output) = &result.output {
            println!("{}", output);
        }
        Ok(())
    } else {
        println!(
            "{} delegation failed after {} ms: {}",
            "error".red().bold(),
            result.metrics.duration_ms,
            result.error.as_deref().unwrap_or("unknown")
        );
        std::process::exit(1);
    }
}

fn build_task(args: &DelegateArgs) -> Result<Task> {
    let id = args
        .id
        .clone()
        .unwrap_or_else(|| format!("task-{}", &uuid_suffix()));

    let priority = match args.priority.parse::<u8>() {
        Ok(level) => TaskPriority::from_level(level),
        Err(_) => serde_json::from_value(serde_json::Value::String(args.priority.clone()))
            .with_context(|| format!("unknown priority '{}'", args.priority))?,
    };

    Ok(Task::new(id, args.description.clone())
        .with_type(args.task_type.clone())
        .with_priority(priority))
}

fn uuid_suffix() -> String {
    // Millisecond timestamp is unique enough for interactively created ids.
    format!(
        "{:x}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    )
}

fn load_context(path: Option<&std::path::Path>) -> Result<ContextMap> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading context file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing context file {}", path.display()))
        }
        None => Ok(ContextMap::new()),
    }
}
