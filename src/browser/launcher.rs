use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tokio::time::sleep;

use super::discovery::{discover_browser, BrowserInfo, BrowserType};
use crate::config::BrowserConfig;
use crate::error::{AxviewError, Result};

/// Google service keys the browser would otherwise nag about
const GOOGLE_ENV_DEFAULTS: [&str; 3] = [
    "GOOGLE_API_KEY",
    "GOOGLE_DEFAULT_CLIENT_ID",
    "GOOGLE_DEFAULT_CLIENT_SECRET",
];

/// Browser launcher that starts a browser with CDP enabled
pub struct BrowserLauncher {
    browser_info: BrowserInfo,
    cdp_port: u16,
    headless: bool,
    user_data_dir: PathBuf,
    extra_args: Vec<String>,
}

impl BrowserLauncher {
    /// Create a launcher for the best browser found on this machine
    pub fn new() -> Result<Self> {
        Ok(Self::with_info(discover_browser()?))
    }

    /// Create a launcher with a specific browser path
    pub fn with_browser_path(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(AxviewError::BrowserLaunchFailed(format!(
                "Browser not found at: {:?}",
                path
            )));
        }

        // Assume Chrome-compatible
        Ok(Self::with_info(BrowserInfo::new(BrowserType::Chrome, path)))
    }

    fn with_info(browser_info: BrowserInfo) -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("axview")
            .join("profile");

        Self {
            browser_info,
            cdp_port: 9222,
            headless: true,
            user_data_dir: data_dir,
            extra_args: Vec::new(),
        }
    }

    /// Create a launcher from browser configuration
    pub fn from_config(config: &BrowserConfig) -> Result<Self> {
        let mut launcher = match config.executable {
            Some(ref path) => {
                Self::with_browser_path(PathBuf::from(shellexpand::tilde(path).to_string()))?
            }
            None => Self::new()?,
        };

        launcher.cdp_port = config.cdp_port;
        launcher.headless = config.headless;
        launcher.extra_args = config.extra_args.clone();

        if let Some(ref dir) = config.user_data_dir {
            launcher.user_data_dir = PathBuf::from(shellexpand::tilde(dir).to_string());
        }

        Ok(launcher)
    }

    /// Build the browser launch arguments
    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.cdp_port),
            format!("--user-data-dir={}", self.user_data_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--window-size=1920,1080".to_string());
        }

        args.extend(self.extra_args.iter().cloned());

        args
    }

    /// Launch the browser and return the process handle
    pub fn launch(&self) -> Result<Child> {
        // Ensure user data directory exists
        std::fs::create_dir_all(&self.user_data_dir)?;

        let args = self.build_args();

        tracing::debug!(
            "Launching browser: {:?} with args: {:?}",
            self.browser_info.path,
            args
        );

        let mut command = Command::new(&self.browser_info.path);
        command
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        for key in GOOGLE_ENV_DEFAULTS {
            if std::env::var_os(key).is_none() {
                command.env(key, "no");
            }
        }

        command.spawn().map_err(|e| {
            AxviewError::BrowserLaunchFailed(format!(
                "Failed to launch {}: {}",
                self.browser_info.browser_type.name(),
                e
            ))
        })
    }

    /// Launch the browser and wait for CDP to be ready
    pub async fn launch_and_wait(&self) -> Result<(Child, String)> {
        let mut child = self.launch()?;

        match self.wait_for_cdp().await {
            Ok(cdp_url) => Ok((child, cdp_url)),
            Err(e) => {
                let _ = child.kill();
                Err(e)
            }
        }
    }

    /// Wait for CDP endpoint to be ready
    async fn wait_for_cdp(&self) -> Result<String> {
        // Try for up to 10 seconds
        for i in 0..20 {
            sleep(Duration::from_millis(500)).await;

            match fetch_browser_ws_url(self.cdp_port).await {
                Ok(ws_url) => {
                    tracing::info!("CDP ready at: {}", ws_url);
                    return Ok(ws_url);
                }
                Err(e) => {
                    tracing::debug!("CDP connection attempt {} failed: {}", i + 1, e);
                }
            }
        }

        Err(AxviewError::CdpConnectionFailed(
            "Timeout waiting for CDP to be ready".to_string(),
        ))
    }

    /// Get browser info
    pub fn browser_info(&self) -> &BrowserInfo {
        &self.browser_info
    }
}

/// Read the browser WebSocket URL from `http://127.0.0.1:{port}/json/version`
pub async fn fetch_browser_ws_url(cdp_port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{}/json/version", cdp_port);

    // Build client with NO_PROXY for localhost
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());

    let response = client.get(&url).send().await.map_err(|e| {
        AxviewError::CdpConnectionFailed(format!(
            "Cannot reach CDP at port {}. Is the browser running with --remote-debugging-port={}? Error: {}",
            cdp_port, cdp_port, e
        ))
    })?;

    if !response.status().is_success() {
        return Err(AxviewError::CdpConnectionFailed(format!(
            "CDP endpoint answered {}",
            response.status()
        )));
    }

    let json: serde_json::Value = response.json().await.map_err(|e| {
        AxviewError::CdpConnectionFailed(format!("Failed to parse CDP response: {}", e))
    })?;

    json.get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            AxviewError::CdpConnectionFailed("No WebSocket URL in CDP response".to_string())
        })
}
