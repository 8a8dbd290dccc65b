//! Line-oriented terminal host for the rendered view.

mod command;
mod view;

pub use command::{ShellCommand, HELP};
pub use view::{format_line, format_view, header, view_lines, ViewLine};

use std::sync::Arc;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::bridge::SnapshotProvider;
use crate::browser::normalize_url;
use crate::error::Result;
use crate::render::{ElementId, Renderer, Selection, Trigger};

/// Whether the shell keeps reading after a command.
enum Flow {
    Continue,
    Quit,
}

/// Prints the view after every update and runs commands typed on stdin.
pub struct Shell {
    renderer: Arc<Renderer>,
    provider: Arc<dyn SnapshotProvider>,
    /// Generation of the last printed tree; indices typed by the user refer to it.
    shown: Option<u64>,
}

impl Shell {
    pub fn new(renderer: Arc<Renderer>, provider: Arc<dyn SnapshotProvider>) -> Self {
        Self {
            renderer,
            provider,
            shown: None,
        }
    }

    /// Run until `quit`, end of input, or `shutdown`.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        let mut updates = self.renderer.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("{}", "Type 'help' for commands.".dimmed());

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.print_view().await;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match self.dispatch(&line).await {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Quit) => break,
                        Err(e) => {
                            tracing::warn!("Command '{}' failed: {}", line.trim(), e);
                            eprintln!("{} {}", "error:".red(), e);
                            if e.is_bridge_failure() {
                                eprintln!("{}", "The page may have changed; try 'refresh'.".dimmed());
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, line: &str) -> Result<Flow> {
        let Some(command) = ShellCommand::parse(line)? else {
            return Ok(Flow::Continue);
        };
        tracing::debug!(?command, "Shell command");

        match command {
            ShellCommand::Click(n) => self.renderer.activate(self.element(n)).await?,
            ShellCommand::Focus(n) => self.renderer.focus(self.element(n)).await?,
            ShellCommand::Type { index, text } => {
                self.renderer.input(self.element(index), &text).await?
            }
            ShellCommand::Select { index, start, end } => {
                self.renderer
                    .select_range(self.element(index), Selection::new(start, end))
                    .await?
            }
            ShellCommand::Go(url) => self.provider.navigate(&normalize_url(&url)?).await?,
            ShellCommand::Back => self.provider.go_back().await?,
            ShellCommand::Forward => self.provider.go_forward().await?,
            ShellCommand::Key(key) => self.provider.send_key(&key).await?,
            ShellCommand::Enter => self.provider.send_key("Enter").await?,
            ShellCommand::Refresh => self.renderer.request_render(Trigger::Manual),
            ShellCommand::Show => self.print_view().await,
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Element `index` of the view the user is looking at. Once the tree is
    /// rebuilt the id stops resolving instead of pointing at another node.
    fn element(&self, index: usize) -> ElementId {
        ElementId::new(self.shown.unwrap_or_default(), index)
    }

    async fn print_view(&mut self) {
        let location = self.renderer.location().await;
        let (generation, head, lines) = self
            .renderer
            .with_tree(|tree| {
                (
                    tree.generation(),
                    header(tree, location.as_deref()),
                    view_lines(tree),
                )
            })
            .await;
        self.shown = Some(generation);

        println!();
        println!("{}", head.bold());
        for line in &lines {
            let text = format_line(line);
            if line.focused {
                println!("{}", text.reversed());
            } else if line.heading {
                println!("{}", text.bold());
            } else {
                println!("{}", text);
            }
        }
    }
}
