use std::time::Duration;

use chromiumoxide::browser::Browser;
use futures::StreamExt;

use super::launcher::BrowserLauncher;
use super::tabs::CdpHost;
use crate::config::ProfileConfig;
use crate::error::{ClipbookError, Result};

fn local_client(timeout: Duration) -> reqwest::Client {
    // Bypass proxies for the local CDP endpoint.
    reqwest::Client::builder()
        .no_proxy()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Fetch the browser WebSocket URL from a local CDP port via /json/version.
/// Returns `None` if the port is unreachable or the response is malformed.
pub async fn fetch_browser_ws_url(cdp_port: u16) -> Option<String> {
    let url = format!("http://127.0.0.1:{}/json/version", cdp_port);
    let resp = local_client(Duration::from_secs(5))
        .get(&url)
        .send()
        .await
        .ok()?;
    let info: serde_json::Value = resp.json().await.ok()?;
    info.get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// `ws://host:port/devtools/browser/<id>` -> `http://host:port`
pub fn http_base_from_ws(ws_url: &str) -> Result<String> {
    let url = reqwest::Url::parse(ws_url)
        .map_err(|e| ClipbookError::CdpConnectionFailed(format!("Bad CDP URL {}: {}", ws_url, e)))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        other => {
            return Err(ClipbookError::CdpConnectionFailed(format!(
                "Unsupported CDP URL scheme: {}",
                other
            )))
        }
    };
    let host = url
        .host_str()
        .ok_or_else(|| ClipbookError::CdpConnectionFailed(format!("No host in {}", ws_url)))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", scheme, host, port),
        None => format!("{}://{}", scheme, host),
    })
}

/// Connects to (or launches) the browser described by a profile
pub struct SessionManager {
    profile: ProfileConfig,
    load_poll_interval: Duration,
}

impl SessionManager {
    pub fn new(profile: ProfileConfig, load_poll_interval: Duration) -> Self {
        Self {
            profile,
            load_poll_interval,
        }
    }

    /// Whether a browser answers on the profile's CDP endpoint
    pub async fn is_reachable(&self) -> bool {
        match self.profile.cdp_url {
            Some(ref ws_url) => match http_base_from_ws(ws_url) {
                Ok(base) => local_client(Duration::from_secs(5))
                    .get(format!("{}/json/version", base))
                    .send()
                    .await
                    .is_ok(),
                Err(_) => false,
            },
            None => fetch_browser_ws_url(self.profile.cdp_port).await.is_some(),
        }
    }

    /// Connect to the profile's browser, launching one if nothing is listening
    pub async fn connect(&self) -> Result<CdpHost> {
        let ws_url = match self.profile.cdp_url {
            Some(ref ws_url) => {
                tracing::debug!("Connecting to configured CDP endpoint {}", ws_url);
                ws_url.clone()
            }
            None => match fetch_browser_ws_url(self.profile.cdp_port).await {
                Some(ws_url) => {
                    tracing::debug!(
                        "Reusing browser on CDP port {}",
                        self.profile.cdp_port
                    );
                    ws_url
                }
                None => {
                    tracing::info!(
                        "No browser on CDP port {}, launching one",
                        self.profile.cdp_port
                    );
                    let launcher = BrowserLauncher::from_profile(&self.profile)?;
                    // The browser outlives this process; the child handle is not kept.
                    let (_child, ws_url) = launcher.launch_and_wait().await?;
                    ws_url
                }
            },
        };

        let http_base = http_base_from_ws(&ws_url)?;
        let (browser, mut handler) = Browser::connect(&ws_url).await.map_err(|e| {
            ClipbookError::CdpConnectionFailed(format!("Failed to connect to browser: {}", e))
        })?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(CdpHost::new(
            browser,
            handler_task,
            http_base,
            local_client(Duration::from_secs(10)),
            self.load_poll_interval,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_base_from_ws_keeps_host_and_port() {
        assert_eq!(
            http_base_from_ws("ws://127.0.0.1:9222/devtools/browser/abc").unwrap(),
            "http://127.0.0.1:9222"
        );
        assert_eq!(
            http_base_from_ws("wss://remote.example.com/devtools/browser/abc").unwrap(),
            "https://remote.example.com"
        );
    }

    #[test]
    fn http_base_from_ws_rejects_other_schemes() {
        assert!(matches!(
            http_base_from_ws("ftp://127.0.0.1:9222"),
            Err(ClipbookError::CdpConnectionFailed(_))
        ));
        assert!(http_base_from_ws("not a url").is_err());
    }

    #[tokio::test]
    async fn fetch_browser_ws_url_returns_none_when_nothing_listens() {
        // Port 1 is privileged and never runs a CDP endpoint in test environments.
        assert!(fetch_browser_ws_url(1).await.is_none());
    }
}
