use colored::Colorize;
use dialoguer::Confirm;

use crate::cli::{Cli, ConfigCommands};
use crate::config::Config;
use crate::error::{ClipbookError, Result};

pub async fn run(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(cli).await,
        ConfigCommands::Set { key, value } => set(cli, key, value).await,
        ConfigCommands::Get { key } => get(cli, key).await,
        ConfigCommands::Path => path(cli).await,
        ConfigCommands::Reset => reset(cli).await,
    }
}

async fn show(cli: &Cli) -> Result<()> {
    let config = Config::load()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| ClipbookError::ConfigError(e.to_string()))?;
        println!("{}", toml_str);
    }

    Ok(())
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ClipbookError::ConfigError(format!("{} must be a number of milliseconds", key)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .trim()
        .parse()
        .map_err(|_| ClipbookError::ConfigError(format!("{} must be true or false", key)))
}

/// Selector lists are given as a JSON array of strings. Anything else is taken
/// as a single selector, commas included.
fn parse_list(key: &str, value: &str) -> Result<Vec<String>> {
    let value = value.trim();
    let selectors = if value.starts_with('[') {
        serde_json::from_str::<Vec<String>>(value).map_err(|e| {
            ClipbookError::ConfigError(format!("{} must be a JSON array of strings: {}", key, e))
        })?
    } else {
        vec![value.to_string()]
    };

    Ok(selectors
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn format_list(selectors: &[String]) -> Result<Option<String>> {
    if selectors.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(selectors)?))
}

pub(crate) fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "browser.executable" => config.browser.executable = Some(value.to_string()),
        "browser.default_profile" => config.browser.default_profile = value.to_string(),
        "browser.headless" => config.browser.headless = parse_bool(key, value)?,
        "automation.destination_url" => config.automation.destination_url = value.to_string(),
        "automation.settle_ms" => config.automation.settle_ms = parse_number(key, value)?,
        "automation.load_timeout_ms" => {
            config.automation.load_timeout_ms = parse_number(key, value)?
        }
        "automation.step_timeout_ms" => {
            config.automation.step_timeout_ms = parse_number(key, value)?
        }
        "automation.poll_interval_ms" => {
            config.automation.poll_interval_ms = parse_number(key, value)?
        }
        "automation.on_miss" => config.automation.on_miss = value.parse()?,
        "automation.close_tab_on_failure" => {
            config.automation.close_tab_on_failure = parse_bool(key, value)?
        }
        "selectors.create" => config.selectors.create = parse_list(key, value)?,
        "selectors.website" => config.selectors.website = parse_list(key, value)?,
        "selectors.url_input" => config.selectors.url_input = parse_list(key, value)?,
        "selectors.insert" => config.selectors.insert = parse_list(key, value)?,
        _ => {
            return Err(ClipbookError::ConfigError(format!(
                "Unknown config key: {}",
                key
            )))
        }
    }

    config.automation.validate()
}

pub(crate) fn read_setting(config: &Config, key: &str) -> Result<Option<String>> {
    let value = match key {
        "browser.executable" => config.browser.executable.clone(),
        "browser.default_profile" => Some(config.browser.default_profile.clone()),
        "browser.headless" => Some(config.browser.headless.to_string()),
        "automation.destination_url" => Some(config.automation.destination_url.clone()),
        "automation.settle_ms" => Some(config.automation.settle_ms.to_string()),
        "automation.load_timeout_ms" => Some(config.automation.load_timeout_ms.to_string()),
        "automation.step_timeout_ms" => Some(config.automation.step_timeout_ms.to_string()),
        "automation.poll_interval_ms" => Some(config.automation.poll_interval_ms.to_string()),
        "automation.on_miss" => Some(config.automation.on_miss.to_string()),
        "automation.close_tab_on_failure" => {
            Some(config.automation.close_tab_on_failure.to_string())
        }
        "selectors.create" => return format_list(&config.selectors.create),
        "selectors.website" => return format_list(&config.selectors.website),
        "selectors.url_input" => return format_list(&config.selectors.url_input),
        "selectors.insert" => return format_list(&config.selectors.insert),
        _ => {
            return Err(ClipbookError::ConfigError(format!(
                "Unknown config key: {}",
                key
            )))
        }
    };

    Ok(value.filter(|v| !v.is_empty()))
}

async fn set(_cli: &Cli, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    apply_setting(&mut config, key, value)?;
    config.save()?;
    println!("{} Set {} = {}", "✓".green(), key, value);

    Ok(())
}

async fn get(cli: &Cli, key: &str) -> Result<()> {
    let config = Config::load()?;
    let value = read_setting(&config, key)?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "key": key,
                "value": value
            })
        );
    } else {
        match value {
            Some(v) => println!("{}", v),
            None => println!("{}", "(not set)".dimmed()),
        }
    }

    Ok(())
}

async fn reset(cli: &Cli) -> Result<()> {
    let path = Config::config_path();

    if !path.exists() {
        if cli.json {
            println!(
                "{}",
                serde_json::json!({ "status": "no_config", "path": path.display().to_string() })
            );
        } else {
            println!("{} No config file to remove.", "✓".green());
        }
        return Ok(());
    }

    if !cli.json {
        let confirm = Confirm::new()
            .with_prompt(format!("Delete {}?", path.display()))
            .default(false)
            .interact()
            .map_err(|e| ClipbookError::Other(format!("Prompt failed: {}", e)))?;

        if !confirm {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    std::fs::remove_file(&path)?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "status": "removed", "path": path.display().to_string() })
        );
    } else {
        println!(
            "{} Config removed: {}",
            "✓".green(),
            path.display().to_string().dimmed()
        );
    }

    Ok(())
}

async fn path(cli: &Cli) -> Result<()> {
    let path = Config::config_path();

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string()
            })
        );
    } else {
        println!("{}", path.display());
    }

    Ok(())
}
