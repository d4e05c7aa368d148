use std::path::Path;

use colored::Colorize;

use crate::automation::{locate, PageDom, SnapshotPage, Target, TargetSet};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

pub async fn run(cli: &Cli, file: &Path, target: Option<Target>) -> Result<()> {
    let config = Config::load()?;
    let targets = TargetSet::from_config(&config.selectors);
    let page = SnapshotPage::from_file(file)?;

    let selected: Vec<Target> = match target {
        Some(target) => vec![target],
        None => Target::ALL.to_vec(),
    };

    let mut results = Vec::new();
    for target in selected {
        let spec = targets.get(target);
        let found = locate(&page, spec).await?;
        let text = match found {
            Some(ref found) => Some(page.text_content(&found.element).await?),
            None => None,
        };
        results.push((target, spec.selectors.len(), found, text));
    }

    if cli.json {
        let entries: Vec<_> = results
            .iter()
            .map(|(target, _, found, text)| {
                serde_json::json!({
                    "target": target.name(),
                    "found": found.is_some(),
                    "selector": found.as_ref().map(|f| f.selector.clone()),
                    "strategy_index": found.as_ref().map(|f| f.strategy_index),
                    "text": text.as_deref().map(str::trim),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{} {}", "Snapshot:".bold(), file.display());
    println!();
    for (target, strategies, found, text) in &results {
        match found {
            Some(found) => {
                println!("  {} {}", "✓".green(), target.label().bold());
                println!(
                    "    Selector: {} {}",
                    found.selector,
                    format!("(strategy {} of {})", found.strategy_index + 1, strategies).dimmed()
                );
                if let Some(text) = text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                    println!("    Text: {}", text.dimmed());
                }
            }
            None => println!(
                "  {} {} {}",
                "✗".red(),
                target.label().bold(),
                format!("(no match in {} strategies)", strategies).dimmed()
            ),
        }
    }

    Ok(())
}
