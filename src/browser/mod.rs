mod discovery;
mod launcher;
mod session;
mod tabs;

pub use discovery::{discover_all_browsers, discover_browser, BrowserInfo, BrowserType};
pub use launcher::BrowserLauncher;
pub use session::{fetch_browser_ws_url, http_base_from_ws, SessionManager};
pub use tabs::{CdpHost, CdpPage};
