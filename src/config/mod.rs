mod profile;

pub use profile::ProfileConfig;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ClipbookError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Automation timing and destination
    #[serde(default)]
    pub automation: AutomationConfig,

    /// Selector list overrides, one list per UI target
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Named profiles
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Browser executable path (overrides auto-discovery)
    pub executable: Option<String>,

    /// Default profile name
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    /// Default headless mode
    #[serde(default)]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            default_profile: default_profile_name(),
            headless: false,
        }
    }
}

fn default_profile_name() -> String {
    "clipbook".to_string()
}

fn normalize_default_profile_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        default_profile_name()
    } else {
        trimmed.to_string()
    }
}

/// What the orchestrator does when a required UI target cannot be found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissPolicy {
    /// Stop the run at the stage that missed
    #[default]
    Abort,
    /// Log the miss and keep going with the next stage
    Continue,
}

impl std::str::FromStr for MissPolicy {
    type Err = ClipbookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(MissPolicy::Abort),
            "continue" => Ok(MissPolicy::Continue),
            other => Err(ClipbookError::ConfigError(format!(
                "on_miss must be 'abort' or 'continue', got '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MissPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissPolicy::Abort => write!(f, "abort"),
            MissPolicy::Continue => write!(f, "continue"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Page opened in the new tab
    #[serde(default = "default_destination_url")]
    pub destination_url: String,

    /// Pause after the destination tab reports loaded
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Upper bound for the destination tab to finish loading
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Upper bound for each UI target to appear
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,

    /// Delay between DOM probes while waiting for a target
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub on_miss: MissPolicy,

    /// Close the destination tab when a run does not complete
    #[serde(default)]
    pub close_tab_on_failure: bool,
}

fn default_destination_url() -> String {
    "https://notebooklm.google.com/".to_string()
}

fn default_settle_ms() -> u64 {
    500
}

fn default_load_timeout_ms() -> u64 {
    30_000
}

fn default_step_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            destination_url: default_destination_url(),
            settle_ms: default_settle_ms(),
            load_timeout_ms: default_load_timeout_ms(),
            step_timeout_ms: default_step_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            on_miss: MissPolicy::default(),
            close_tab_on_failure: false,
        }
    }
}

/// Durations derived from [`AutomationConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub settle: Duration,
    pub load_timeout: Duration,
    pub step_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        AutomationConfig::default().timing()
    }
}

impl AutomationConfig {
    pub fn timing(&self) -> Timing {
        Timing {
            settle: Duration::from_millis(self.settle_ms),
            load_timeout: Duration::from_millis(self.load_timeout_ms),
            step_timeout: Duration::from_millis(self.step_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(ClipbookError::ConfigError(
                "automation.poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        let url = reqwest::Url::parse(&self.destination_url).map_err(|e| {
            ClipbookError::ConfigError(format!(
                "automation.destination_url '{}' is not a valid URL: {}",
                self.destination_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClipbookError::ConfigError(format!(
                "automation.destination_url must be http(s), got '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}

/// Per-target selector overrides. An empty list falls back to the built-in one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub create: Vec<String>,

    #[serde(default)]
    pub website: Vec<String>,

    #[serde(default)]
    pub url_input: Vec<String>,

    #[serde(default)]
    pub insert: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(default_profile_name(), ProfileConfig::default());

        Self {
            browser: BrowserConfig::default(),
            automation: AutomationConfig::default(),
            selectors: SelectorConfig::default(),
            profiles,
        }
    }
}

impl Config {
    pub fn effective_default_profile_name(&self) -> String {
        normalize_default_profile_name(&self.browser.default_profile)
    }

    /// Load configuration from all sources (file, env, defaults)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration using `path` as the config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            // CLIPBOOK_AUTOMATION__SETTLE_MS -> automation.settle_ms
            .merge(Env::prefixed("CLIPBOOK_").split("__"))
            .extract()
            .map_err(|e| ClipbookError::ConfigError(e.to_string()))?;

        config.automation.validate()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipbook")
            .join("config.toml")
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ClipbookError::ConfigError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get a profile by name, falling back to default
    pub fn get_profile(&self, name: &str) -> Result<ProfileConfig> {
        let normalized_name = name.trim();

        if let Some(profile) = self.profiles.get(normalized_name) {
            let mut profile = profile.clone();
            if profile.browser_path.is_none() {
                profile.browser_path = self.browser.executable.clone();
            }
            return Ok(profile);
        }

        // The configured default profile always exists, implicitly if need be.
        if normalized_name == self.effective_default_profile_name() {
            let mut profile = ProfileConfig::default();

            if let Some(ref exe) = self.browser.executable {
                profile.browser_path = Some(exe.clone());
            }
            profile.headless = self.browser.headless;

            return Ok(profile);
        }

        Err(ClipbookError::ConfigError(format!(
            "Profile not found: {}",
            normalized_name
        )))
    }

    /// Add or update a profile
    pub fn set_profile(&mut self, name: &str, profile: ProfileConfig) {
        self.profiles.insert(name.to_string(), profile);
    }

    /// Remove a profile
    pub fn remove_profile(&mut self, name: &str) -> Result<()> {
        let normalized_name = name.trim();

        if normalized_name == self.effective_default_profile_name() {
            return Err(ClipbookError::ConfigError(
                "Cannot remove the default profile".to_string(),
            ));
        }

        self.profiles.remove(normalized_name).ok_or_else(|| {
            ClipbookError::ConfigError(format!("Profile not found: {}", normalized_name))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_uses_clipbook_profile() {
        let config = Config::default();

        assert_eq!(config.browser.default_profile, "clipbook");
        assert!(config.profiles.contains_key("clipbook"));
        assert_eq!(
            config.automation.destination_url,
            "https://notebooklm.google.com/"
        );
        assert_eq!(config.automation.on_miss, MissPolicy::Abort);
    }

    #[test]
    fn timing_converts_milliseconds() {
        let automation = AutomationConfig {
            settle_ms: 250,
            load_timeout_ms: 1_000,
            step_timeout_ms: 2_000,
            poll_interval_ms: 50,
            ..Default::default()
        };

        let timing = automation.timing();
        assert_eq!(timing.settle, Duration::from_millis(250));
        assert_eq!(timing.load_timeout, Duration::from_secs(1));
        assert_eq!(timing.step_timeout, Duration::from_secs(2));
        assert_eq!(timing.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let automation = AutomationConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            automation.validate(),
            Err(ClipbookError::ConfigError(_))
        ));
    }

    #[test]
    fn validate_rejects_non_http_destination() {
        let automation = AutomationConfig {
            destination_url: "file:///etc/passwd".to_string(),
            ..Default::default()
        };
        assert!(automation.validate().is_err());

        let automation = AutomationConfig {
            destination_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(automation.validate().is_err());
    }

    #[test]
    fn miss_policy_parses_case_insensitively() {
        assert_eq!("Continue".parse::<MissPolicy>().unwrap(), MissPolicy::Continue);
        assert_eq!(" abort ".parse::<MissPolicy>().unwrap(), MissPolicy::Abort);
        assert!("retry".parse::<MissPolicy>().is_err());
    }

    #[test]
    fn get_profile_returns_implicit_configured_default_profile() {
        let config = Config {
            browser: BrowserConfig {
                executable: Some("/usr/bin/chromium".to_string()),
                default_profile: "team".to_string(),
                headless: true,
            },
            profiles: HashMap::new(),
            ..Default::default()
        };

        let profile = config.get_profile("team").unwrap();
        assert_eq!(profile.browser_path.as_deref(), Some("/usr/bin/chromium"));
        assert!(profile.headless);
    }

    #[test]
    fn get_profile_returns_error_for_missing_profile() {
        let config = Config::default();
        assert!(matches!(
            config.get_profile("missing-profile"),
            Err(ClipbookError::ConfigError(msg)) if msg.contains("missing-profile")
        ));
    }

    #[test]
    fn remove_profile_blocks_default_profile() {
        let mut config = Config::default();
        config.browser.default_profile = "  ".to_string();

        let result = config.remove_profile("clipbook");
        assert!(matches!(result, Err(ClipbookError::ConfigError(_))));
    }

    #[test]
    #[serial]
    fn load_from_merges_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[automation]
settle_ms = 900
on_miss = "continue"

[selectors]
create = ["button.new-notebook"]
"#,
        )
        .unwrap();

        std::env::set_var("CLIPBOOK_AUTOMATION__STEP_TIMEOUT_MS", "4321");
        let config = Config::load_from(&path);
        std::env::remove_var("CLIPBOOK_AUTOMATION__STEP_TIMEOUT_MS");
        let config = config.unwrap();

        assert_eq!(config.automation.settle_ms, 900);
        assert_eq!(config.automation.step_timeout_ms, 4321);
        assert_eq!(config.automation.on_miss, MissPolicy::Continue);
        assert_eq!(config.selectors.create, vec!["button.new-notebook"]);
        assert!(config.selectors.insert.is_empty());
    }

    #[test]
    #[serial]
    fn save_to_round_trips_through_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.automation.load_timeout_ms = 12_000;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.automation.load_timeout_ms, 12_000);
    }
}
