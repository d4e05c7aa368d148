pub mod config;
pub mod listen;
pub mod probe;
pub mod profile;
pub mod run;
pub mod status;

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::Cli;
use crate::config::{Config, ProfileConfig};
use crate::error::Result;

/// Resolve the active profile and apply global CLI overrides to it
pub(crate) fn effective_profile(cli: &Cli, config: &Config) -> Result<(String, ProfileConfig)> {
    let name = match cli.profile.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.to_string(),
        None => config.effective_default_profile_name(),
    };
    let mut profile = config.get_profile(&name)?;

    if let Some(ref path) = cli.browser_path {
        profile.browser_path = Some(path.clone());
    }
    if let Some(ref cdp) = cli.cdp {
        profile.apply_cdp_override(cdp);
    }
    if cli.headless {
        profile.headless = true;
    }

    Ok((name, profile))
}

/// Spinner shown during long-running work; `None` in JSON mode
pub(crate) fn create_spinner(json: bool, message: &str) -> Option<ProgressBar> {
    if json {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("  {spinner} {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

pub(crate) fn finish_spinner(pb: Option<ProgressBar>, ok: bool, message: &str) {
    if let Some(pb) = pb {
        let mark = if ok { "✓".green() } else { "✗".red() };
        pb.finish_with_message(format!("{} {}", mark, message));
    }
}
