use std::process::Child;

use chromiumoxide::browser::Browser;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::launcher::{fetch_browser_ws_url, BrowserLauncher};
use crate::config::BrowserConfig;
use crate::error::{AxviewError, Result};

/// A connected browser and the page being mirrored.
///
/// Owns the browser process when it was launched here; an attached browser
/// (`--cdp`) is left running on shutdown.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    child: Option<Child>,
}

impl BrowserSession {
    /// Attach to `cdp` when given, otherwise launch a browser per `config`.
    pub async fn start(config: &BrowserConfig, cdp: Option<&str>) -> Result<Self> {
        match cdp {
            Some(endpoint) => {
                let ws_url = resolve_cdp_endpoint(endpoint).await?;
                tracing::info!("Attaching to browser at {}", ws_url);
                Self::connect(&ws_url).await
            }
            None => {
                let launcher = BrowserLauncher::from_config(config)?;
                tracing::info!(
                    "Launching {} ({:?})",
                    launcher.browser_info().browser_type.name(),
                    launcher.browser_info().path
                );
                let (mut child, ws_url) = launcher.launch_and_wait().await?;
                match Self::connect(&ws_url).await {
                    Ok(mut session) => {
                        session.child = Some(child);
                        Ok(session)
                    }
                    Err(e) => {
                        let _ = child.kill();
                        Err(e)
                    }
                }
            }
        }
    }

    async fn connect(ws_url: &str) -> Result<Self> {
        let (browser, mut handler) = Browser::connect(ws_url).await.map_err(|e| {
            AxviewError::CdpConnectionFailed(format!("Failed to connect to browser: {}", e))
        })?;

        // Spawn handler to process events
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler error: {}", e);
                }
            }
        });

        let pages = browser
            .pages()
            .await
            .map_err(|e| AxviewError::CdpConnectionFailed(e.to_string()))?;
        let page = match pages.into_iter().next() {
            Some(page) => page,
            None => browser
                .new_page("about:blank")
                .await
                .map_err(|e| AxviewError::CdpConnectionFailed(e.to_string()))?,
        };

        Ok(Self {
            browser,
            page,
            handler,
            child: None,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the browser if we launched it and stop the CDP handler.
    pub async fn shutdown(mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = self.browser.close().await {
                tracing::debug!("Browser close failed: {}", e);
            }
            let _ = child.kill();
            let _ = child.wait();
        }
        self.handler.abort();
    }
}

/// Resolve a `--cdp` argument (port number, `http(s)://host:port`, or `ws://` URL)
/// to the browser WebSocket URL.
pub async fn resolve_cdp_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        return Ok(endpoint.to_string());
    }

    fetch_browser_ws_url(cdp_port(endpoint)?).await
}

/// Debugging port named by a bare port or an `http(s)://host:port` endpoint.
fn cdp_port(endpoint: &str) -> Result<u16> {
    let host_port = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .map(|rest| rest.trim_end_matches('/'));

    host_port
        .and_then(|host_port| host_port.rsplit(':').next())
        .unwrap_or(endpoint)
        .parse::<u16>()
        .map_err(|_| {
            AxviewError::CdpConnectionFailed(
                "Invalid endpoint. Use a port number or WebSocket URL (ws://...).".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn websocket_endpoints_pass_through() {
        let url = "ws://127.0.0.1:9222/devtools/browser/abc";
        assert_eq!(resolve_cdp_endpoint(url).await.unwrap(), url);
    }

    #[tokio::test]
    async fn garbage_endpoint_is_rejected() {
        assert!(matches!(
            resolve_cdp_endpoint("not-a-port").await,
            Err(AxviewError::CdpConnectionFailed(_))
        ));
    }

    #[test]
    fn port_is_read_from_http_and_https_endpoints() {
        assert_eq!(cdp_port("9222").unwrap(), 9222);
        assert_eq!(cdp_port("http://127.0.0.1:9222").unwrap(), 9222);
        assert_eq!(cdp_port("https://devtools.local:9333/").unwrap(), 9333);
        assert!(cdp_port("https://devtools.local").is_err());
    }

    #[tokio::test]
    async fn port_endpoint_queries_the_browser() {
        // Nothing listens on port 1
        assert!(resolve_cdp_endpoint("http://127.0.0.1:1").await.is_err());
    }
}
