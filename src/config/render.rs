use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::render::ProjectionOptions;

/// Render loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Milliseconds between polling render cycles
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Links with longer names get the long-link style
    #[serde(default = "default_long_link_threshold")]
    pub long_link_threshold: usize,
}

fn default_poll_interval_ms() -> u64 {
    1500
}

fn default_long_link_threshold() -> usize {
    25
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            long_link_threshold: default_long_link_threshold(),
        }
    }
}

impl RenderConfig {
    /// Polling interval, never shorter than 100ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions {
            long_link_threshold: self.long_link_threshold,
        }
    }
}
