use std::sync::Arc;

use colored::Colorize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bridge::SnapshotProvider;
use crate::browser::{normalize_url, BrowserSession, CdpSnapshotProvider};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::render::{RenderLoop, Renderer};
use crate::shell::Shell;

pub async fn run(cli: &Cli, url: Option<&str>) -> Result<()> {
    let config = cli.effective_config()?;
    let start_url = normalize_url(url.unwrap_or(&config.start_url))?;

    let session = BrowserSession::start(&config.browser, cli.cdp.as_deref()).await?;
    let result = browse(&session, &config, &start_url).await;
    session.shutdown().await;
    result
}

async fn browse(session: &BrowserSession, config: &Config, start_url: &str) -> Result<()> {
    let provider = Arc::new(CdpSnapshotProvider::attach(session.page().clone()).await?);

    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let events = provider.forward_signals(signal_tx).await?;

    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
    let renderer = Arc::new(Renderer::new(
        provider.clone(),
        config.render.projection_options(),
        trigger_tx,
    ));

    let shutdown = CancellationToken::new();
    let render_loop = RenderLoop::new(
        renderer.clone(),
        config.render.poll_interval(),
        trigger_rx,
        signal_rx,
    );
    let loop_task = tokio::spawn(render_loop.run(shutdown.clone()));

    let interrupted = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down");
            interrupted.cancel();
        }
    });

    // A page that fails to load still leaves the shell usable
    if let Err(e) = provider.navigate(start_url).await {
        tracing::warn!("Failed to open {}: {}", start_url, e);
        eprintln!("{} {}", "error:".red(), e);
    }

    let result = Shell::new(renderer, provider).run(shutdown.clone()).await;

    shutdown.cancel();
    if let Err(e) = loop_task.await {
        tracing::debug!("Render loop task ended abnormally: {}", e);
    }
    events.abort();
    result
}
