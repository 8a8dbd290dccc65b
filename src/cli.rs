use clap::{Parser, Subcommand};

use crate::commands;
use crate::config::Config;
use crate::error::Result;

/// axview - Browse the web through its accessibility tree
#[derive(Parser)]
#[command(name = "axview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Browser executable path (overrides auto-discovery)
    #[arg(long, env = "AXVIEW_BROWSER_PATH", global = true)]
    pub browser_path: Option<String>,

    /// Attach to a running browser: CDP port or WebSocket URL
    #[arg(long, env = "AXVIEW_CDP", global = true)]
    pub cdp: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long, global = true)]
    pub show: bool,

    /// Milliseconds between polling render cycles
    #[arg(long, value_name = "MS", global = true)]
    pub poll_interval: Option<u64>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a page and browse it interactively (default)
    Browse {
        /// URL to open (defaults to the configured start page)
        url: Option<String>,
    },

    /// Render a page once, print it, and exit
    Snapshot {
        /// URL to render (defaults to the configured start page)
        url: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g. render.poll_interval_ms)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Show the configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            None => commands::browse::run(self, None).await,
            Some(Commands::Browse { url }) => commands::browse::run(self, url.as_deref()).await,
            Some(Commands::Snapshot { url }) => {
                commands::snapshot::run(self, url.as_deref()).await
            }
            Some(Commands::Config { command }) => commands::config::run(self, command).await,
        }
    }

    /// Loaded configuration with command-line overrides applied.
    pub fn effective_config(&self) -> Result<Config> {
        let mut config = Config::load()?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.browser_path {
            config.browser.executable = Some(path.clone());
        }
        if self.show {
            config.browser.headless = false;
        }
        if let Some(ms) = self.poll_interval {
            config.render.poll_interval_ms = ms;
        }
    }
}
