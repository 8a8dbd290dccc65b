use thiserror::Error;

use crate::ax::NodeHandle;

#[derive(Error, Debug)]
pub enum AxviewError {
    #[error("Browser not found. Please install Chrome, Chromium, Brave, or Edge.")]
    BrowserNotFound,

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("CDP connection failed: {0}")]
    CdpConnectionFailed(String),

    /// A remote operation against the page failed
    #[error("Bridge call `{operation}` failed: {message}")]
    Bridge {
        operation: &'static str,
        message: String,
    },

    /// The page node behind a handle is gone (usually after a navigation)
    #[error("Node handle {0} no longer resolves to a page node")]
    StaleHandle(NodeHandle),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("No element with index {0} in the current view")]
    UnknownElement(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AxviewError {
    pub fn bridge(operation: &'static str, err: impl std::fmt::Display) -> Self {
        AxviewError::Bridge {
            operation,
            message: err.to_string(),
        }
    }

    /// True for failures of the snapshot/automation side of the bridge.
    pub fn is_bridge_failure(&self) -> bool {
        matches!(
            self,
            AxviewError::Bridge { .. }
                | AxviewError::StaleHandle(_)
                | AxviewError::JavaScriptError(_)
                | AxviewError::CdpConnectionFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AxviewError>;
