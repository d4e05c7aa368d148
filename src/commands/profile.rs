use colored::Colorize;

use crate::cli::{Cli, ProfileCommands};
use crate::config::{Config, ProfileConfig};
use crate::error::{ClipbookError, Result};

pub async fn run(cli: &Cli, command: &ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::List => list(cli).await,
        ProfileCommands::Create { name, cdp_port } => create(cli, name, *cdp_port).await,
        ProfileCommands::Delete { name } => delete(cli, name).await,
        ProfileCommands::Show { name } => show(cli, name).await,
    }
}

/// Next free CDP port after the highest one already assigned
pub(crate) fn next_cdp_port(config: &Config) -> u16 {
    config
        .profiles
        .values()
        .map(|p| p.cdp_port)
        .max()
        .map(|port| port.saturating_add(1))
        .unwrap_or(9222)
}

async fn list(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let default_name = config.effective_default_profile_name();

    let mut names: Vec<&String> = config.profiles.keys().collect();
    names.sort();

    if cli.json {
        let mut profiles: Vec<_> = names
            .iter()
            .map(|name| {
                let profile = &config.profiles[*name];
                serde_json::json!({
                    "name": name,
                    "cdp_port": profile.cdp_port,
                    "headless": profile.headless,
                    "is_remote": profile.is_remote(),
                    "default": **name == default_name,
                })
            })
            .collect();
        if !config.profiles.contains_key(&default_name) {
            profiles.push(serde_json::json!({
                "name": default_name,
                "implicit": true,
                "default": true,
            }));
        }
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    println!("{}", "Profiles:".bold());
    println!();

    for name in names {
        let profile = &config.profiles[name];
        let default_marker = if *name == default_name {
            " (default)".dimmed()
        } else {
            "".into()
        };

        println!("  {} {}{}", "●".cyan(), name.bold(), default_marker);
        match profile.cdp_url {
            Some(ref url) => println!("    CDP URL: {}", url.dimmed()),
            None => println!("    CDP Port: {}", profile.cdp_port),
        }
        if profile.headless {
            println!("    Mode: {}", "headless".dimmed());
        }
        println!();
    }

    if !config.profiles.contains_key(&default_name) {
        let port = config
            .get_profile(&default_name)
            .map(|p| p.cdp_port)
            .unwrap_or(9222);
        println!("  {} {} (implicit)", "●".cyan(), default_name.bold());
        println!("    CDP Port: {}", port);
        println!();
    }

    Ok(())
}

async fn create(cli: &Cli, name: &str, cdp_port: Option<u16>) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClipbookError::ConfigError(
            "Profile name cannot be empty".to_string(),
        ));
    }

    let mut config = Config::load()?;
    let profile = ProfileConfig::with_cdp_port(cdp_port.unwrap_or_else(|| next_cdp_port(&config)));

    config.set_profile(name, profile.clone());
    config.save()?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "name": name,
                "cdp_port": profile.cdp_port
            })
        );
    } else {
        println!(
            "{} Created profile: {} (CDP port: {})",
            "✓".green(),
            name.bold(),
            profile.cdp_port
        );
    }

    Ok(())
}

async fn delete(cli: &Cli, name: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.remove_profile(name)?;
    config.save()?;

    if cli.json {
        println!("{}", serde_json::json!({ "success": true, "name": name }));
    } else {
        println!("{} Deleted profile: {}", "✓".green(), name);
    }

    Ok(())
}

async fn show(cli: &Cli, name: &str) -> Result<()> {
    let config = Config::load()?;
    let profile = config.get_profile(name)?;

    if cli.json {
        let mut value = serde_json::to_value(&profile)?;
        value["name"] = serde_json::json!(name);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", "Profile:".bold(), name.cyan());
    println!();
    println!("  CDP Port: {}", profile.cdp_port);
    if let Some(ref url) = profile.cdp_url {
        println!("  CDP URL: {}", url);
    }
    if let Some(ref dir) = profile.user_data_dir {
        println!("  User Data: {}", dir);
    }
    if let Some(ref path) = profile.browser_path {
        println!("  Browser: {}", path);
    }
    println!("  Headless: {}", profile.headless);
    if !profile.extra_args.is_empty() {
        println!("  Extra Args: {}", profile.extra_args.join(" "));
    }

    Ok(())
}
