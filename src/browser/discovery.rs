use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{AxviewError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserType {
    Chrome,
    Chromium,
    Brave,
    Edge,
}

impl BrowserType {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserType::Chrome => "Google Chrome",
            BrowserType::Chromium => "Chromium",
            BrowserType::Brave => "Brave",
            BrowserType::Edge => "Microsoft Edge",
        }
    }

    /// Executable names to look up on PATH
    fn path_names(&self) -> &'static [&'static str] {
        match self {
            BrowserType::Chrome => &["google-chrome", "google-chrome-stable", "chrome"],
            BrowserType::Chromium => &["chromium", "chromium-browser"],
            BrowserType::Brave => &["brave-browser", "brave"],
            BrowserType::Edge => &["microsoft-edge", "msedge"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserInfo {
    pub browser_type: BrowserType,
    pub path: PathBuf,
    pub version: Option<String>,
}

impl BrowserInfo {
    pub fn new(browser_type: BrowserType, path: PathBuf) -> Self {
        Self {
            browser_type,
            path,
            version: None,
        }
    }

    pub fn with_version(mut self) -> Self {
        self.version = detect_version(&self.path);
        self
    }
}

/// Discover the best available browser on the system
pub fn discover_browser() -> Result<BrowserInfo> {
    discover_all_browsers()
        .into_iter()
        .next()
        .ok_or(AxviewError::BrowserNotFound)
}

/// Discover all available browsers, highest priority first
pub fn discover_all_browsers() -> Vec<BrowserInfo> {
    let mut found = Vec::new();

    for (browser_type, paths) in get_browser_candidates() {
        let known = paths
            .iter()
            .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
            .find(|p| p.exists());
        let path = known.or_else(|| {
            browser_type
                .path_names()
                .iter()
                .find_map(|name| find_browser_in_path(name))
        });

        if let Some(path) = path {
            found.push(BrowserInfo::new(browser_type, path).with_version());
        }
    }

    found
}

/// Get browser candidates based on the current platform
fn get_browser_candidates() -> Vec<(BrowserType, Vec<&'static str>)> {
    #[cfg(target_os = "macos")]
    {
        vec![
            (
                BrowserType::Chrome,
                vec![
                    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                    "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                ],
            ),
            (
                BrowserType::Chromium,
                vec![
                    "/Applications/Chromium.app/Contents/MacOS/Chromium",
                    "~/Applications/Chromium.app/Contents/MacOS/Chromium",
                ],
            ),
            (
                BrowserType::Brave,
                vec!["/Applications/Brave Browser.app/Contents/MacOS/Brave Browser"],
            ),
            (
                BrowserType::Edge,
                vec!["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"],
            ),
        ]
    }

    #[cfg(target_os = "linux")]
    {
        vec![
            (
                BrowserType::Chrome,
                vec![
                    "/usr/bin/google-chrome",
                    "/usr/bin/google-chrome-stable",
                    "/opt/google/chrome/chrome",
                ],
            ),
            (
                BrowserType::Chromium,
                vec![
                    "/usr/bin/chromium",
                    "/usr/bin/chromium-browser",
                    "/snap/bin/chromium",
                ],
            ),
            (
                BrowserType::Brave,
                vec!["/usr/bin/brave-browser", "/usr/bin/brave"],
            ),
            (
                BrowserType::Edge,
                vec!["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"],
            ),
        ]
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            (
                BrowserType::Chrome,
                vec![
                    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                ],
            ),
            (BrowserType::Chromium, vec![]),
            (
                BrowserType::Brave,
                vec![r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe"],
            ),
            (
                BrowserType::Edge,
                vec![
                    r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
                    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
                ],
            ),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        vec![
            (BrowserType::Chrome, vec![]),
            (BrowserType::Chromium, vec![]),
        ]
    }
}

/// Detect browser version from `--version` output like "Google Chrome 120.0.6099.109"
fn detect_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;

    if !output.status.success() {
        return None;
    }
    parse_version(&String::from_utf8_lossy(&output.stdout))
}

fn parse_version(output: &str) -> Option<String> {
    let version = output.trim();
    if version.is_empty() {
        return None;
    }
    match version.rfind(' ') {
        Some(idx) => Some(version[idx + 1..].to_string()),
        None => Some(version.to_string()),
    }
}

/// Find a browser executable on PATH
pub fn find_browser_in_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
