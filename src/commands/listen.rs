use std::sync::Arc;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use super::run::{connect, print_report};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{ClipbookError, Result};

/// Dispatch command identifiers read from stdin until EOF.
///
/// Each line runs on its own task so a trigger that arrives mid-run hits the
/// orchestrator's in-flight guard instead of queueing behind it.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let orchestrator = Arc::new(connect(cli, &config).await?);
    let json = cli.json;

    if !json {
        println!(
            "{} Listening for commands on stdin (e.g. {})",
            "●".cyan(),
            "run-automation".bold()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let command = line.trim().to_string();
        if command.is_empty() {
            continue;
        }

        let orchestrator = Arc::clone(&orchestrator);
        tasks.spawn(async move {
            match orchestrator.handle_command(&command).await {
                None => {
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({ "command": command, "status": "ignored" })
                        );
                    }
                }
                Some(Ok(report)) => {
                    if let Err(e) = print_report(json, &report) {
                        tracing::error!("Failed to print report: {}", e);
                    }
                }
                Some(Err(ClipbookError::RunInProgress)) => {
                    if json {
                        println!(
                            "{}",
                            serde_json::json!({ "command": command, "status": "busy" })
                        );
                    } else {
                        println!("  {} Run already in progress, trigger ignored", "!".yellow());
                    }
                }
                Some(Err(e)) => tracing::error!("Command {} failed: {}", command, e),
            }
        });

        // Reap finished runs so the set does not grow unbounded.
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!("Automation task panicked: {}", e);
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Automation task panicked: {}", e);
        }
    }

    Ok(())
}
