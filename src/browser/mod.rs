mod discovery;
mod launcher;
mod provider;
mod session;
mod snapshot;
mod url;

pub use discovery::{discover_all_browsers, discover_browser, BrowserInfo, BrowserType};
pub use launcher::BrowserLauncher;
pub use provider::CdpSnapshotProvider;
pub use session::{resolve_cdp_endpoint, BrowserSession};
pub use snapshot::{fold_snapshot, RawAxNode};
pub use url::normalize_url;
