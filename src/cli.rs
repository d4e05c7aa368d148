use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::automation::Target;
use crate::commands;
use crate::config::MissPolicy;
use crate::error::Result;

/// Clipbook CLI - Send the current browser tab to NotebookLM as a website source
#[derive(Parser)]
#[command(name = "clipbook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Browser executable path (overrides auto-discovery)
    #[arg(long, env = "CLIPBOOK_BROWSER_PATH", global = true)]
    pub browser_path: Option<String>,

    /// CDP port or WebSocket URL
    #[arg(long, env = "CLIPBOOK_CDP", global = true)]
    pub cdp: Option<String>,

    /// Profile name to use
    #[arg(short = 'P', long, env = "CLIPBOOK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Launch the browser in headless mode
    #[arg(long, env = "CLIPBOOK_HEADLESS", global = true)]
    pub headless: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send the active tab to the destination notebook
    Run {
        /// Destination URL (overrides automation.destination_url)
        #[arg(long)]
        destination: Option<String>,

        /// What to do when a UI element is missing: abort or continue
        #[arg(long)]
        on_miss: Option<MissPolicy>,
    },

    /// Dispatch a command identifier (e.g. run-automation)
    Trigger {
        /// Command identifier
        command: String,
    },

    /// Read command identifiers from stdin, one per line
    Listen,

    /// Test selector lists against a saved HTML page
    Probe {
        /// HTML snapshot of the destination page
        file: PathBuf,

        /// Only probe this target (create, website, url-input, insert)
        #[arg(short, long)]
        target: Option<Target>,
    },

    /// Show detected browsers and CDP reachability
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Profile management
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. automation.settle_ms)
        key: String,
        /// Configuration value. Selector lists take a JSON array, e.g.
        /// '["button.add", "[aria-label=Insert]"]'; a plain value is one selector.
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show configuration file path
    Path,

    /// Delete the configuration file
    Reset,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List all profiles
    List,

    /// Create a new profile
    Create {
        /// Profile name
        name: String,

        /// CDP port
        #[arg(long)]
        cdp_port: Option<u16>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },

    /// Show profile details
    Show {
        /// Profile name
        name: String,
    },
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Run {
                destination,
                on_miss,
            } => commands::run::run(self, destination.as_deref(), *on_miss).await,
            Commands::Trigger { command } => commands::run::trigger(self, command).await,
            Commands::Listen => commands::listen::run(self).await,
            Commands::Probe { file, target } => commands::probe::run(self, file, *target).await,
            Commands::Status => commands::status::run(self).await,
            Commands::Config { command } => commands::config::run(self, command).await,
            Commands::Profile { command } => commands::profile::run(self, command).await,
        }
    }
}
