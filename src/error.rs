use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipbookError {
    #[error("Browser not found. Please install Chrome, Brave, or Edge.")]
    BrowserNotFound,

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("CDP connection failed: {0}")]
    CdpConnectionFailed(String),

    #[error("Browser not running. Start it with --remote-debugging-port or let clipbook launch it.")]
    BrowserNotRunning,

    #[error("No active tab found")]
    NoActiveTab,

    #[error("Active tab has no usable URL: {0}")]
    MissingSourceUrl(String),

    #[error("Failed to create tab: {0}")]
    TabCreateFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptError(String),

    /// The document changed under a DOM call; probing again may succeed
    #[error("Page changed during query: {0}")]
    PageUnstable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("An automation run is already in progress")]
    RunInProgress,

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ClipbookError>;
