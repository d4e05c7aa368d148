use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tokio::time::sleep;

use super::discovery::{discover_browser, BrowserInfo, BrowserType};
use super::session::fetch_browser_ws_url;
use crate::config::ProfileConfig;
use crate::error::{ClipbookError, Result};

/// Starts a Chromium-family browser with CDP enabled
pub struct BrowserLauncher {
    browser_info: BrowserInfo,
    cdp_port: u16,
    headless: bool,
    user_data_dir: PathBuf,
    extra_args: Vec<String>,
}

fn default_user_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clipbook")
        .join("profiles")
        .join("default")
}

impl BrowserLauncher {
    fn with_browser(browser_info: BrowserInfo) -> Self {
        Self {
            browser_info,
            cdp_port: 9222,
            headless: false,
            user_data_dir: default_user_data_dir(),
            extra_args: Vec::new(),
        }
    }

    /// Create a launcher for the auto-discovered browser
    pub fn new() -> Result<Self> {
        Ok(Self::with_browser(discover_browser()?))
    }

    /// Create a launcher with a specific browser path
    pub fn with_browser_path(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ClipbookError::BrowserLaunchFailed(format!(
                "Browser not found at: {:?}",
                path
            )));
        }

        // Any explicit path is assumed to be Chrome-compatible.
        Ok(Self::with_browser(BrowserInfo::new(BrowserType::Chrome, path)))
    }

    /// Create a launcher from profile configuration
    pub fn from_profile(profile: &ProfileConfig) -> Result<Self> {
        let mut launcher = match profile.browser_path {
            Some(ref path) => Self::with_browser_path(PathBuf::from(shellexpand::tilde(path).as_ref()))?,
            None => Self::new()?,
        };

        launcher.cdp_port = profile.cdp_port;
        launcher.headless = profile.headless;
        launcher.extra_args = profile.extra_args.clone();

        if let Some(ref dir) = profile.user_data_dir {
            launcher.user_data_dir = PathBuf::from(shellexpand::tilde(dir).to_string());
        }

        Ok(launcher)
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.cdp_port),
            format!("--user-data-dir={}", self.user_data_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Launch the browser and return the process handle
    pub fn launch(&self) -> Result<Child> {
        std::fs::create_dir_all(&self.user_data_dir)?;

        let args = self.build_args();
        tracing::debug!(
            "Launching browser: {:?} with args: {:?}",
            self.browser_info.path,
            args
        );

        Command::new(&self.browser_info.path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ClipbookError::BrowserLaunchFailed(format!(
                    "Failed to launch {}: {}",
                    self.browser_info.browser_type.name(),
                    e
                ))
            })
    }

    /// Launch the browser and wait for its CDP endpoint
    pub async fn launch_and_wait(&self) -> Result<(Child, String)> {
        let child = self.launch()?;
        let cdp_url = self.wait_for_cdp().await?;
        Ok((child, cdp_url))
    }

    async fn wait_for_cdp(&self) -> Result<String> {
        // Try for up to 10 seconds
        for attempt in 1..=20 {
            sleep(Duration::from_millis(500)).await;

            match fetch_browser_ws_url(self.cdp_port).await {
                Some(ws_url) => {
                    tracing::info!("CDP ready at: {}", ws_url);
                    return Ok(ws_url);
                }
                None => tracing::debug!("CDP not ready yet (attempt {})", attempt),
            }
        }

        Err(ClipbookError::CdpConnectionFailed(
            "Timeout waiting for CDP to be ready".to_string(),
        ))
    }

    pub fn browser_info(&self) -> &BrowserInfo {
        &self.browser_info
    }

    pub fn cdp_port(&self) -> u16 {
        self.cdp_port
    }
}
