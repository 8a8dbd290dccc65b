use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::diff::snapshot_changed;
use super::element::{ElementId, ElementTree, Selection};
use super::projector::{project, ProjectionOptions};
use crate::ax::AccessibilityNode;
use crate::bridge::{PageSignal, SnapshotProvider};
use crate::error::{AxviewError, Result};

/// Why a render cycle was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Navigated(String),
    Load,
    DomReady,
    /// An activated element asked for a fresh view.
    Interaction,
    Manual,
}

impl From<PageSignal> for Trigger {
    fn from(signal: PageSignal) -> Self {
        match signal {
            PageSignal::Navigated(url) => Trigger::Navigated(url),
            PageSignal::Load => Trigger::Load,
            PageSignal::DomReady => Trigger::DomReady,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The snapshot matched the rendered one; nothing was touched.
    Skipped,
    Rebuilt { elements: usize },
}

/// State owned by the render cycle.
struct RenderedView {
    previous: Option<AccessibilityNode>,
    tree: ElementTree,
    location: Option<String>,
    revision: u64,
}

/// Owns the rendered tree and the snapshot it was built from.
pub struct Renderer {
    provider: Arc<dyn SnapshotProvider>,
    options: ProjectionOptions,
    view: Mutex<RenderedView>,
    triggers: mpsc::UnboundedSender<Trigger>,
    updates: watch::Sender<u64>,
    cycles: AtomicU64,
}

impl Renderer {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        options: ProjectionOptions,
        triggers: mpsc::UnboundedSender<Trigger>,
    ) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            provider,
            options,
            view: Mutex::new(RenderedView {
                previous: None,
                tree: ElementTree::new(),
                location: None,
                revision: 0,
            }),
            triggers,
            updates,
            cycles: AtomicU64::new(0),
        }
    }

    /// Receiver that ticks whenever the view (tree or location) changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// Ask the render loop for a new cycle.
    pub fn request_render(&self, trigger: Trigger) {
        if self.triggers.send(trigger).is_err() {
            tracing::debug!("Render loop is gone, dropping render request");
        }
    }

    /// One fetch → diff → (skip | rebuild) pass.
    ///
    /// The stored snapshot and tree are only replaced after the whole pass
    /// succeeded, so a failed fetch leaves the current view untouched.
    pub async fn render(&self) -> Result<RenderOutcome> {
        let snapshot = self.provider.fetch_snapshot().await?;

        let mut view = self.view.lock().await;
        if !snapshot_changed(view.previous.as_ref(), &snapshot) {
            return Ok(RenderOutcome::Skipped);
        }

        let focus = view.tree.capture_focus();
        let mut tree = project(&snapshot, &self.options);
        if let Some(focus) = &focus {
            if !tree.restore_focus(focus) {
                tracing::debug!("Focused node {} left the page", focus.node_id);
            }
        }

        let elements = tree.len();
        view.tree = tree;
        view.previous = Some(snapshot);
        view.revision += 1;
        let revision = view.revision;
        drop(view);

        self.updates.send_replace(revision);
        Ok(RenderOutcome::Rebuilt { elements })
    }

    /// Run a cycle on behalf of a trigger, logging instead of propagating failures.
    pub async fn run_cycle(&self, trigger: Trigger) -> Option<RenderOutcome> {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        match self.render().await {
            Ok(outcome) => {
                tracing::debug!(cycle, ?trigger, ?outcome, "Render cycle finished");
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!(cycle, ?trigger, "Render cycle aborted: {}", e);
                None
            }
        }
    }

    /// Read the current tree.
    pub async fn with_tree<R>(&self, f: impl FnOnce(&ElementTree) -> R) -> R {
        let view = self.view.lock().await;
        f(&view.tree)
    }

    pub async fn location(&self) -> Option<String> {
        self.view.lock().await.location.clone()
    }

    pub async fn set_location(&self, url: impl Into<String>) {
        let mut view = self.view.lock().await;
        view.location = Some(url.into());
        view.revision += 1;
        let revision = view.revision;
        drop(view);
        self.updates.send_replace(revision);
    }

    /// The snapshot the current tree was built from.
    pub async fn last_snapshot(&self) -> Option<AccessibilityNode> {
        self.view.lock().await.previous.clone()
    }

    /// Click an element: default action on its node, then a fresh cycle.
    ///
    /// Unbound elements (labels, button groups) pass the click to the nearest
    /// bound ancestor.
    pub async fn activate(&self, id: ElementId) -> Result<()> {
        let binding = {
            let view = self.view.lock().await;
            let tree = &view.tree;
            tree.get(id).ok_or(AxviewError::UnknownElement(id.index()))?;
            let mut current = Some(id);
            let mut found = None;
            while let Some(cursor) = current {
                let element = tree.get(cursor);
                if let Some(binding) = element.and_then(|e| e.binding.clone()) {
                    found = Some(binding);
                    break;
                }
                current = element.and_then(|e| e.parent());
            }
            found
        };

        let Some(binding) = binding else {
            tracing::debug!("Element {} has nothing to activate", id);
            return Ok(());
        };
        if let Some(handle) = binding.handle {
            self.provider.perform_default_action(handle).await?;
        }
        self.request_render(Trigger::Interaction);
        Ok(())
    }

    /// Move page focus to an element's node, then focus it locally.
    pub async fn focus(&self, id: ElementId) -> Result<()> {
        let binding = {
            let view = self.view.lock().await;
            if id == view.tree.root() {
                return Err(AxviewError::UnknownElement(id.index()));
            }
            let element = view
                .tree
                .get(id)
                .ok_or(AxviewError::UnknownElement(id.index()))?;
            element.binding.clone()
        };

        if let Some(handle) = binding.and_then(|b| b.handle) {
            self.provider.focus_node(handle).await?;
        }

        // A rebuild while the call was in flight already replaced the tree
        let focused = self.view.lock().await.tree.focus(id);
        if focused {
            self.updates.send_modify(|revision| *revision += 1);
        }
        Ok(())
    }

    /// Forward a new value to an input's node and echo it in the view.
    ///
    /// The echo only happens once the page accepted the value; the cycle
    /// requested afterwards replaces it with what the page reports.
    pub async fn input(&self, id: ElementId, value: &str) -> Result<()> {
        let binding = {
            let view = self.view.lock().await;
            let element = view
                .tree
                .get(id)
                .ok_or(AxviewError::UnknownElement(id.index()))?;
            if !element.kind.accepts_input() {
                return Err(AxviewError::InvalidCommand(format!(
                    "element {} ({}) does not accept input",
                    id,
                    element.kind.tag()
                )));
            }
            element.binding.clone()
        };

        if let Some(handle) = binding.and_then(|b| b.handle) {
            self.provider.set_node_value(handle, value).await?;
        }

        let echoed = {
            let mut view = self.view.lock().await;
            let tree = &mut view.tree;
            if let Some(element) = tree.get_mut(id) {
                element.value = Some(value.to_string());
                element.selection = None;
            }
            tree.focus(id)
        };
        if echoed {
            self.updates.send_modify(|revision| *revision += 1);
        }
        self.request_render(Trigger::Interaction);
        Ok(())
    }

    /// Focus a text input and set its selection. Purely local.
    pub async fn select_range(&self, id: ElementId, selection: Selection) -> Result<()> {
        let mut view = self.view.lock().await;
        if view.tree.get(id).is_none() {
            return Err(AxviewError::UnknownElement(id.index()));
        }
        if !view.tree.select_range(id, selection) {
            return Err(AxviewError::InvalidCommand(format!(
                "element {} is not a text input",
                id
            )));
        }
        drop(view);
        self.updates.send_modify(|revision| *revision += 1);
        Ok(())
    }
}

/// Turns timer ticks, page signals, and render requests into render cycles.
pub struct RenderLoop {
    renderer: Arc<Renderer>,
    interval: Duration,
    triggers: mpsc::UnboundedReceiver<Trigger>,
    signals: mpsc::UnboundedReceiver<PageSignal>,
}

impl RenderLoop {
    pub fn new(
        renderer: Arc<Renderer>,
        interval: Duration,
        triggers: mpsc::UnboundedReceiver<Trigger>,
        signals: mpsc::UnboundedReceiver<PageSignal>,
    ) -> Self {
        Self {
            renderer,
            interval,
            triggers,
            signals,
        }
    }

    /// Spawn one independent cycle per trigger until `shutdown` fires.
    ///
    /// Cycles are not serialized: a stalled bridge call holds up only its own
    /// cycle. Timer ticks are dropped while a timer cycle is still running, so
    /// a stalled page does not pile up one task per tick. In-flight cycles are
    /// aborted on shutdown.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = JoinSet::new();
        let timer_busy = Arc::new(AtomicBool::new(false));

        loop {
            let trigger = tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(_) = cycles.join_next(), if !cycles.is_empty() => continue,
                _ = ticker.tick() => Trigger::Timer,
                Some(signal) = self.signals.recv() => Trigger::from(signal),
                Some(trigger) = self.triggers.recv() => trigger,
            };

            if let Trigger::Navigated(url) = &trigger {
                self.renderer.set_location(url.clone()).await;
            }

            let timer = trigger == Trigger::Timer;
            if timer && timer_busy.swap(true, Ordering::AcqRel) {
                tracing::debug!("Previous timer cycle still running, skipping tick");
                continue;
            }

            let renderer = Arc::clone(&self.renderer);
            let timer_busy = Arc::clone(&timer_busy);
            cycles.spawn(async move {
                renderer.run_cycle(trigger).await;
                if timer {
                    timer_busy.store(false, Ordering::Release);
                }
            });
        }

        cycles.abort_all();
        tracing::debug!("Render loop stopped");
    }
}
