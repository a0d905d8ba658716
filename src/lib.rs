// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;
pub mod observe;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{BoxedHandler, RuntimeEvent, Workflow};
use crate::exec::ShellHandler;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - definition loading
/// - workflow registration (shell handlers, reliance, events, listener)
/// - the async drive loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config_path();
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let mut workflow = build_workflow(&cfg)?;
    workflow.register_listener(|event: &str| println!("event: {event}"))?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = workflow.event_sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested);
        });
    }

    workflow.run_to_completion().await?;
    info!("workflow done");
    Ok(())
}

/// Register one [`ShellHandler`] per task plus the reliance and event
/// tables of a validated definition. The listener is left to the caller.
pub fn build_workflow(cfg: &ConfigFile) -> errors::Result<Workflow> {
    let mut workflow = Workflow::new();

    workflow.register_handlers(cfg.task.iter().map(|(name, task)| {
        let handler: BoxedHandler = Box::new(ShellHandler::new(name.clone(), task.cmd.clone()));
        (name.clone(), handler)
    }))?;

    workflow.register_reliance(
        cfg.task
            .iter()
            .map(|(name, task)| (name.clone(), task.after.clone())),
    )?;

    workflow.register_events(
        cfg.event
            .iter()
            .map(|(id, ev)| (id.clone(), ev.require.clone())),
    )?;

    Ok(workflow)
}

/// Simple dry-run output: print tasks, deps, commands and events.
fn print_dry_run(cfg: &ConfigFile) {
    println!("taskgate dry-run");
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }

    println!();
    println!("events ({}):", cfg.event.len());
    for (id, ev) in cfg.event.iter() {
        println!("  - {id}");
        println!("      require: {:?}", ev.require);
    }

    debug!("dry-run complete (no execution)");
}
