use colored::Colorize;

use super::effective_profile;
use crate::browser::{discover_all_browsers, SessionManager};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

pub async fn run(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let (profile_name, profile) = effective_profile(cli, &config)?;
    let browsers = discover_all_browsers();

    let endpoint = match profile.cdp_url {
        Some(ref url) => url.clone(),
        None => format!("127.0.0.1:{}", profile.cdp_port),
    };
    let reachable = SessionManager::new(profile, config.automation.timing().poll_interval)
        .is_reachable()
        .await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "profile": profile_name,
                "cdp_endpoint": endpoint,
                "cdp_reachable": reachable,
                "destination_url": config.automation.destination_url,
                "browsers": browsers,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Browsers:".bold());
    if browsers.is_empty() {
        println!("  {} none detected", "✗".red());
    }
    for browser in &browsers {
        println!(
            "  {} {} {}",
            "●".cyan(),
            browser.browser_type.name(),
            browser.version.as_deref().unwrap_or("unknown version").dimmed()
        );
        println!("    {}", browser.path.display().to_string().dimmed());
    }

    println!();
    println!("{} {}", "Profile:".bold(), profile_name.cyan());
    let state = if reachable {
        "reachable".green()
    } else {
        "not running".yellow()
    };
    println!("  CDP: {} ({})", endpoint, state);
    println!("  Destination: {}", config.automation.destination_url);

    Ok(())
}
