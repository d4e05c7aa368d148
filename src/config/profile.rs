use serde::{Deserialize, Serialize};

/// Browser connection settings for one named profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// CDP port for this profile
    #[serde(default = "default_cdp_port")]
    pub cdp_port: u16,

    /// User data directory for this profile
    pub user_data_dir: Option<String>,

    /// Browser executable path (profile-specific override)
    pub browser_path: Option<String>,

    /// Headless mode
    #[serde(default)]
    pub headless: bool,

    /// CDP WebSocket URL of an already running browser
    pub cdp_url: Option<String>,

    /// Extra browser arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_cdp_port() -> u16 {
    9222
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            cdp_port: default_cdp_port(),
            user_data_dir: None,
            browser_path: None,
            headless: false,
            cdp_url: None,
            extra_args: Vec::new(),
        }
    }
}

impl ProfileConfig {
    /// Create a new profile with a specific CDP port
    pub fn with_cdp_port(port: u16) -> Self {
        Self {
            cdp_port: port,
            ..Default::default()
        }
    }

    /// Create a profile for remote connection
    pub fn remote(cdp_url: String) -> Self {
        Self {
            cdp_url: Some(cdp_url),
            ..Default::default()
        }
    }

    /// Check if this is a remote profile
    pub fn is_remote(&self) -> bool {
        self.cdp_url.is_some()
    }

    /// Apply a `--cdp` value, which is either a port number or a WebSocket URL
    pub fn apply_cdp_override(&mut self, cdp: &str) {
        let cdp = cdp.trim();
        match cdp.parse::<u16>() {
            Ok(port) => {
                self.cdp_port = port;
                self.cdp_url = None;
            }
            Err(_) => self.cdp_url = Some(cdp.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdp_override_accepts_port() {
        let mut profile = ProfileConfig::remote("ws://old".to_string());
        profile.apply_cdp_override("9333");

        assert_eq!(profile.cdp_port, 9333);
        assert!(!profile.is_remote());
    }

    #[test]
    fn cdp_override_accepts_ws_url() {
        let mut profile = ProfileConfig::with_cdp_port(9222);
        profile.apply_cdp_override("ws://127.0.0.1:9222/devtools/browser/abc");

        assert_eq!(
            profile.cdp_url.as_deref(),
            Some("ws://127.0.0.1:9222/devtools/browser/abc")
        );
    }
}
