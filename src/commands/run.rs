use colored::Colorize;

use super::{create_spinner, effective_profile, finish_spinner};
use crate::automation::{Orchestrator, RunOutcome, RunReport, StepOutcome, RUN_AUTOMATION};
use crate::browser::{CdpHost, SessionManager};
use crate::cli::Cli;
use crate::config::{Config, MissPolicy};
use crate::error::{ClipbookError, Result};

pub async fn run(
    cli: &Cli,
    destination: Option<&str>,
    on_miss: Option<MissPolicy>,
) -> Result<()> {
    let mut config = Config::load()?;

    if let Some(destination) = destination {
        config.automation.destination_url = destination.to_string();
        config.automation.validate()?;
    }
    if let Some(policy) = on_miss {
        config.automation.on_miss = policy;
    }

    let orchestrator = connect(cli, &config).await?;
    execute(cli, &orchestrator).await
}

pub async fn trigger(cli: &Cli, command: &str) -> Result<()> {
    if command.trim() != RUN_AUTOMATION {
        tracing::debug!(command, "Ignoring unknown command");
        if cli.json {
            println!(
                "{}",
                serde_json::json!({ "command": command, "status": "ignored" })
            );
        } else {
            println!("{} Unknown command ignored: {}", "-".dimmed(), command);
        }
        return Ok(());
    }

    let config = Config::load()?;
    let orchestrator = connect(cli, &config).await?;
    execute(cli, &orchestrator).await
}

/// Connect to the profile's browser and build an orchestrator around it
pub(crate) async fn connect(cli: &Cli, config: &Config) -> Result<Orchestrator<CdpHost>> {
    let (profile_name, profile) = effective_profile(cli, config)?;
    tracing::debug!("Using profile: {}", profile_name);

    let session = SessionManager::new(profile, config.automation.timing().poll_interval);
    let host = session.connect().await?;
    Ok(Orchestrator::from_config(host, config))
}

async fn execute(cli: &Cli, orchestrator: &Orchestrator<CdpHost>) -> Result<()> {
    let spinner = create_spinner(cli.json, "Sending tab to notebook...");
    let report = orchestrator.run().await;

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            finish_spinner(spinner, false, "Not started");
            return Err(e);
        }
    };
    finish_spinner(
        spinner,
        report.is_completed(),
        if report.is_completed() {
            "Done"
        } else {
            "Stopped"
        },
    );

    print_report(cli.json, &report)?;

    match report.outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Aborted { stage, reason } => Err(ClipbookError::Other(format!(
            "Automation aborted at {}: {}",
            stage, reason
        ))),
    }
}

pub(crate) fn print_report(json: bool, report: &RunReport) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if let Some(ref url) = report.source_url {
        println!("  {} {}", "Source:".bold(), url);
    }

    for step in &report.steps {
        match step.outcome {
            StepOutcome::Completed {
                ref selector,
                strategy_index,
            } => println!(
                "  {} {} {}",
                "✓".green(),
                step.target.label(),
                format!("via {} (#{})", selector, strategy_index + 1).dimmed()
            ),
            StepOutcome::NotFound => {
                println!("  {} {} not found", "✗".red(), step.target.label())
            }
        }
    }

    match report.outcome {
        RunOutcome::Completed => println!("  {} Tab sent", "✓".green()),
        RunOutcome::Aborted {
            ref stage,
            ref reason,
        } => println!(
            "  {} Stopped at {}: {}",
            "!".yellow(),
            stage.to_string().bold(),
            reason
        ),
    }

    Ok(())
}
