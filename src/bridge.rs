use async_trait::async_trait;

use crate::ax::{AccessibilityNode, NodeHandle};
use crate::error::Result;

/// The automation side of the bridge: produces snapshots and acts on page nodes.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Capture the accessibility tree of the current page.
    async fn fetch_snapshot(&self) -> Result<AccessibilityNode>;

    /// Run the node's default action (a click). No-op when it has none.
    async fn perform_default_action(&self, handle: NodeHandle) -> Result<()>;

    /// Move input focus to the node.
    async fn focus_node(&self, handle: NodeHandle) -> Result<()>;

    /// Set an editable node's value.
    async fn set_node_value(&self, handle: NodeHandle, value: &str) -> Result<()>;

    async fn navigate(&self, url: &str) -> Result<()>;

    async fn go_back(&self) -> Result<()>;

    async fn go_forward(&self) -> Result<()>;

    /// Press and release a key on the page.
    async fn send_key(&self, key: &str) -> Result<()>;
}

/// Page lifecycle notifications pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSignal {
    /// The main frame committed a navigation to this URL.
    Navigated(String),
    Load,
    DomReady,
}
