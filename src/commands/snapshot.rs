use std::sync::Arc;

use tokio::sync::mpsc;

use crate::bridge::SnapshotProvider;
use crate::browser::{normalize_url, BrowserSession, CdpSnapshotProvider};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::render::Renderer;
use crate::shell::format_view;

pub async fn run(cli: &Cli, url: Option<&str>) -> Result<()> {
    let config = cli.effective_config()?;
    let target = normalize_url(url.unwrap_or(&config.start_url))?;

    let session = BrowserSession::start(&config.browser, cli.cdp.as_deref()).await?;
    let result = snapshot(cli, &session, &config, &target).await;
    session.shutdown().await;
    result
}

async fn snapshot(cli: &Cli, session: &BrowserSession, config: &Config, target: &str) -> Result<()> {
    let provider = Arc::new(CdpSnapshotProvider::attach(session.page().clone()).await?);
    provider.navigate(target).await?;

    // No render loop runs here, so requested re-renders are simply dropped
    let (trigger_tx, _trigger_rx) = mpsc::unbounded_channel();
    let renderer = Renderer::new(provider.clone(), config.render.projection_options(), trigger_tx);
    let outcome = renderer.render().await?;
    tracing::debug!(?outcome, "Snapshot rendered");

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&renderer.last_snapshot().await)?
        );
        return Ok(());
    }

    if let Some(url) = provider.current_url().await? {
        renderer.set_location(url).await;
    }
    let location = renderer.location().await;
    let view = renderer
        .with_tree(|tree| format_view(tree, location.as_deref()))
        .await;
    println!("{}", view);

    Ok(())
}
