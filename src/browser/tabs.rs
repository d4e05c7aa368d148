//! CDP-backed `TabHost` and `PageDom`.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use crate::automation::{PageDom, TabHost, TabInfo};
use crate::error::{ClipbookError, Result};

/// Entry from the CDP /json/list endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetEntry {
    id: String,
    #[serde(default)]
    url: String,
    #[serde(rename = "type")]
    target_type: String,
}

/// A browser connected over CDP
pub struct CdpHost {
    browser: Browser,
    handler_task: JoinHandle<()>,
    http_base: String,
    client: reqwest::Client,
    load_poll_interval: Duration,
}

impl CdpHost {
    pub fn new(
        browser: Browser,
        handler_task: JoinHandle<()>,
        http_base: String,
        client: reqwest::Client,
        load_poll_interval: Duration,
    ) -> Self {
        Self {
            browser,
            handler_task,
            http_base,
            client,
            load_poll_interval,
        }
    }

    async fn list_targets(&self) -> Result<Vec<TargetEntry>> {
        let url = format!("{}/json/list", self.http_base);
        let response = self.client.get(&url).send().await.map_err(|e| {
            ClipbookError::CdpConnectionFailed(format!("Failed to list tabs: {}", e))
        })?;
        response.json().await.map_err(|e| {
            ClipbookError::CdpConnectionFailed(format!("Failed to parse tab list: {}", e))
        })
    }
}

impl Drop for CdpHost {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// Chrome lists page targets most-recently-activated first.
fn pick_active(targets: Vec<TargetEntry>) -> Option<TabInfo> {
    targets
        .into_iter()
        .find(|t| t.target_type == "page")
        .map(|t| TabInfo {
            id: t.id,
            url: Some(t.url).filter(|u| !u.is_empty()),
        })
}

#[async_trait]
impl TabHost for CdpHost {
    type Page = CdpPage;

    async fn active_tab(&self) -> Result<Option<TabInfo>> {
        Ok(pick_active(self.list_targets().await?))
    }

    async fn open_tab(&self, url: &str) -> Result<CdpPage> {
        match timeout(Duration::from_secs(30), self.browser.new_page(url)).await {
            Ok(Ok(page)) => Ok(CdpPage { page }),
            Ok(Err(e)) => Err(ClipbookError::TabCreateFailed(e.to_string())),
            Err(_) => Err(ClipbookError::TabCreateFailed(format!(
                "opening {} timed out after 30 seconds",
                url
            ))),
        }
    }

    async fn wait_until_loaded(&self, page: &CdpPage) -> Result<()> {
        loop {
            match page.ready_state().await {
                Ok(state) if state == "complete" => return Ok(()),
                Ok(state) => tracing::debug!(state = state.as_str(), "Tab still loading"),
                // Evaluation fails while the document is being swapped out.
                Err(e) => tracing::debug!("readyState unavailable: {}", e),
            }
            sleep(self.load_poll_interval).await;
        }
    }

    async fn close_tab(&self, page: CdpPage) -> Result<()> {
        page.page
            .close()
            .await
            .map_err(|e| ClipbookError::Other(format!("Failed to close tab: {}", e)))
    }
}

/// A tab driven through CDP
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    async fn ready_state(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.readyState")
            .await
            .map_err(|e| ClipbookError::JavaScriptError(e.to_string()))?;
        Ok(result.into_value::<String>()?)
    }

    /// Call `body` as a function with `this` bound to the element
    async fn call_on(&self, element: &Element, body: &str) -> Result<Option<serde_json::Value>> {
        let returns = element
            .call_js_fn(format!("function() {{ {} }}", body), false)
            .await
            .map_err(|e| match e {
                // The node was detached or the document replaced under us.
                CdpError::Chrome(err) => ClipbookError::PageUnstable(err.message),
                other => ClipbookError::JavaScriptError(other.to_string()),
            })?;
        if let Some(details) = returns.exception_details {
            let message = details
                .exception
                .and_then(|e| e.description)
                .unwrap_or(details.text);
            return Err(ClipbookError::JavaScriptError(message));
        }
        Ok(returns.result.value)
    }
}

/// Whether a protocol error message comes from the DOM engine rejecting a selector
fn is_selector_syntax_error(message: &str) -> bool {
    message.contains("is not a valid selector") || message.contains("SyntaxError")
}

/// Classify a protocol-level failure of a selector query
fn query_error(selector: &str, message: &str) -> ClipbookError {
    if is_selector_syntax_error(message) {
        ClipbookError::InvalidSelector(format!("{}: {}", selector, message))
    } else {
        ClipbookError::PageUnstable(format!("{}: {}", selector, message))
    }
}

fn as_text(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    }
}

#[async_trait]
impl PageDom for CdpPage {
    type Element = Element;

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.page.find_elements(selector).await.map_err(|e| match e {
            CdpError::Chrome(err) => query_error(selector, &err.message),
            other => ClipbookError::CdpConnectionFailed(other.to_string()),
        })
    }

    async fn text_content(&self, element: &Element) -> Result<String> {
        let value = self.call_on(element, "return this.textContent || '';").await?;
        Ok(as_text(value).unwrap_or_default())
    }

    async fn descendant_text(&self, element: &Element, selector: &str) -> Result<Option<String>> {
        let selector_json = serde_json::to_string(selector)?;
        let body = format!(
            "const n = this.querySelector({}); return n ? n.textContent : null;",
            selector_json
        );
        match self.call_on(element, &body).await {
            Ok(value) => Ok(as_text(value)),
            Err(ClipbookError::JavaScriptError(e)) if is_selector_syntax_error(&e) => {
                Err(ClipbookError::InvalidSelector(format!("{}: {}", selector, e)))
            }
            Err(e) => Err(e),
        }
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element
            .click()
            .await
            .map_err(|e| ClipbookError::Other(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn set_value(&self, element: &Element, value: &str) -> Result<()> {
        let value_json = serde_json::to_string(value)?;
        self.call_on(element, &format!("this.focus(); this.value = {};", value_json))
            .await?;
        Ok(())
    }

    async fn dispatch_event(&self, element: &Element, event_type: &str) -> Result<()> {
        let event_json = serde_json::to_string(event_type)?;
        self.call_on(
            element,
            &format!(
                "this.dispatchEvent(new Event({}, {{ bubbles: true }}));",
                event_json
            ),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, url: &str, target_type: &str) -> TargetEntry {
        TargetEntry {
            id: id.to_string(),
            url: url.to_string(),
            target_type: target_type.to_string(),
        }
    }

    #[test]
    fn pick_active_skips_non_page_targets() {
        let targets = vec![
            entry("sw", "chrome-extension://abc/bg.js", "service_worker"),
            entry("t1", "https://example.com/article", "page"),
            entry("t2", "https://other.example", "page"),
        ];

        let tab = pick_active(targets).unwrap();
        assert_eq!(tab.id, "t1");
        assert_eq!(tab.url.as_deref(), Some("https://example.com/article"));
    }

    #[test]
    fn pick_active_treats_empty_url_as_missing() {
        let tab = pick_active(vec![entry("t1", "", "page")]).unwrap();
        assert_eq!(tab.url, None);
        assert!(pick_active(vec![entry("w", "x", "worker")]).is_none());
    }

    #[test]
    fn selector_syntax_errors_are_invalid_selectors() {
        let err = query_error(
            "button[",
            "Failed to execute 'querySelectorAll' on 'Document': 'button[' is not a valid selector.",
        );
        assert!(matches!(err, ClipbookError::InvalidSelector(_)));

        let err = query_error("a:has(", "SyntaxError: DOM Exception 12");
        assert!(matches!(err, ClipbookError::InvalidSelector(_)));
    }

    #[test]
    fn node_errors_are_transient() {
        for message in [
            "Could not find node with given id",
            "No node with given id found",
            "Cannot find context with specified id",
        ] {
            let err = query_error("button.mat-flat-button", message);
            assert!(
                matches!(err, ClipbookError::PageUnstable(_)),
                "{} should be transient",
                message
            );
        }
    }

    #[test]
    fn target_entry_deserializes_from_json_list() {
        let json = r#"[{"id":"A1","title":"Article","type":"page","url":"https://example.com","webSocketDebuggerUrl":"ws://x"}]"#;
        let targets: Vec<TargetEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(targets[0].target_type, "page");
    }
}
