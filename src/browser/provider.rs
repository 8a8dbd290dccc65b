use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::accessibility::{
    EnableParams as AccessibilityEnableParams, GetFullAxTreeParams,
};
use chromiumoxide::cdp::browser_protocol::dom::{BackendNodeId, ResolveNodeParams};
use chromiumoxide::cdp::browser_protocol::emulation::SetFocusEmulationEnabledParams;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::{
    EventDomContentEventFired, EventFrameNavigated, EventLoadEventFired,
    GetNavigationHistoryParams, NavigateToHistoryEntryParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams, RemoteObjectId};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::snapshot::{fold_snapshot, RawAxNode};
use crate::ax::{AccessibilityNode, NodeHandle};
use crate::bridge::{PageSignal, SnapshotProvider};
use crate::error::{AxviewError, Result};

const CLICK_FN: &str = "function() { if (this.click) this.click(); }";
const FOCUS_FN: &str = "function() { if (this.focus) this.focus(); }";
const SET_VALUE_FN: &str = "function(value) { \
    this.value = value; \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
}";

/// [`SnapshotProvider`] backed by a live page over the Chrome DevTools Protocol.
pub struct CdpSnapshotProvider {
    page: Page,
}

impl CdpSnapshotProvider {
    /// Wrap a page, enabling the accessibility domain and focus emulation so a
    /// headless page still reports focus.
    pub async fn attach(page: Page) -> Result<Self> {
        page.execute(AccessibilityEnableParams::default())
            .await
            .map_err(|e| AxviewError::bridge("attach", e))?;
        page.execute(SetFocusEmulationEnabledParams::new(true))
            .await
            .map_err(|e| AxviewError::bridge("attach", e))?;

        Ok(Self { page })
    }

    /// Forward main-frame navigations, load and DOM-ready events to `signals`.
    pub async fn forward_signals(
        &self,
        signals: mpsc::UnboundedSender<PageSignal>,
    ) -> Result<JoinHandle<()>> {
        let mut navigated = self
            .page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(|e| AxviewError::bridge("forward_signals", e))?;
        let mut loaded = self
            .page
            .event_listener::<EventLoadEventFired>()
            .await
            .map_err(|e| AxviewError::bridge("forward_signals", e))?;
        let mut dom_ready = self
            .page
            .event_listener::<EventDomContentEventFired>()
            .await
            .map_err(|e| AxviewError::bridge("forward_signals", e))?;

        Ok(tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    Some(event) = navigated.next() => {
                        // Subframe navigations don't move the location bar
                        if event.frame.parent_id.is_some() {
                            continue;
                        }
                        PageSignal::Navigated(event.frame.url.clone())
                    }
                    Some(_) = loaded.next() => PageSignal::Load,
                    Some(_) = dom_ready.next() => PageSignal::DomReady,
                    else => break,
                };
                if signals.send(signal).is_err() {
                    break;
                }
            }
            tracing::debug!("Page event streams closed");
        }))
    }

    /// Current URL of the page, if it has one.
    pub async fn current_url(&self) -> Result<Option<String>> {
        self.page
            .url()
            .await
            .map_err(|e| AxviewError::bridge("current_url", e))
    }

    async fn resolve(&self, handle: NodeHandle) -> Result<RemoteObjectId> {
        let params = ResolveNodeParams::builder()
            .backend_node_id(BackendNodeId::new(handle.raw()))
            .build();
        let resolved = self.page.execute(params).await.map_err(|e| {
            tracing::debug!("DOM.resolveNode failed for {}: {}", handle, e);
            AxviewError::StaleHandle(handle)
        })?;

        resolved
            .result
            .object
            .object_id
            .clone()
            .ok_or(AxviewError::StaleHandle(handle))
    }

    /// Run `function` with `this` bound to the node behind `handle`.
    async fn call_on_node(
        &self,
        operation: &'static str,
        handle: NodeHandle,
        function: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<()> {
        let object_id = self.resolve(handle).await?;

        let params = CallFunctionOnParams::builder()
            .function_declaration(function)
            .object_id(object_id)
            .arguments(
                args.into_iter()
                    .map(|value| CallArgument::builder().value(value).build()),
            )
            .await_promise(true)
            .build()
            .map_err(|e| AxviewError::bridge(operation, e))?;

        let response = self
            .page
            .execute(params)
            .await
            .map_err(|e| AxviewError::bridge(operation, e))?;

        if let Some(details) = &response.result.exception_details {
            return Err(AxviewError::JavaScriptError(details.text.clone()));
        }
        Ok(())
    }

    async fn go_to_history_offset(&self, operation: &'static str, offset: i64) -> Result<()> {
        let history = self
            .page
            .execute(GetNavigationHistoryParams::default())
            .await
            .map_err(|e| AxviewError::bridge(operation, e))?;

        let target = history.result.current_index + offset;
        let entry = usize::try_from(target)
            .ok()
            .and_then(|i| history.result.entries.get(i));
        let Some(entry) = entry else {
            tracing::debug!("No history entry at offset {}", offset);
            return Ok(());
        };

        self.page
            .execute(NavigateToHistoryEntryParams::new(entry.id))
            .await
            .map_err(|e| AxviewError::bridge(operation, e))?;
        Ok(())
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, key: &KeyDefinition) -> Result<()> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key.key.clone())
            .code(key.code.clone())
            .windows_virtual_key_code(key.virtual_key_code);
        if kind == DispatchKeyEventType::KeyDown && !key.text.is_empty() {
            builder = builder.text(key.text.clone());
        }
        let params = builder
            .build()
            .map_err(|e| AxviewError::bridge("send_key", e))?;

        self.page
            .execute(params)
            .await
            .map_err(|e| AxviewError::bridge("send_key", e))?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotProvider for CdpSnapshotProvider {
    async fn fetch_snapshot(&self) -> Result<AccessibilityNode> {
        let tree = self
            .page
            .execute(GetFullAxTreeParams::default())
            .await
            .map_err(|e| AxviewError::bridge("fetch_snapshot", e))?;

        let raw: Vec<RawAxNode> = serde_json::from_value(serde_json::to_value(&tree.result.nodes)?)?;
        fold_snapshot(&raw)
    }

    async fn perform_default_action(&self, handle: NodeHandle) -> Result<()> {
        self.call_on_node("perform_default_action", handle, CLICK_FN, Vec::new())
            .await
    }

    async fn focus_node(&self, handle: NodeHandle) -> Result<()> {
        self.call_on_node("focus_node", handle, FOCUS_FN, Vec::new())
            .await
    }

    async fn set_node_value(&self, handle: NodeHandle, value: &str) -> Result<()> {
        self.call_on_node(
            "set_node_value",
            handle,
            SET_VALUE_FN,
            vec![serde_json::Value::String(value.to_string())],
        )
        .await
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AxviewError::bridge("navigate", e))?;
        Ok(())
    }

    async fn go_back(&self) -> Result<()> {
        self.go_to_history_offset("go_back", -1).await
    }

    async fn go_forward(&self) -> Result<()> {
        self.go_to_history_offset("go_forward", 1).await
    }

    async fn send_key(&self, key: &str) -> Result<()> {
        let key = KeyDefinition::lookup(key);
        self.dispatch_key(DispatchKeyEventType::KeyDown, &key).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, &key).await
    }
}

/// What CDP needs to synthesize one key press.
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyDefinition {
    key: String,
    code: String,
    text: String,
    virtual_key_code: i64,
}

impl KeyDefinition {
    /// Map a key name to its DOM key, code, text and Windows virtual key code.
    /// Unknown names are sent as a printable key.
    fn lookup(name: &str) -> Self {
        let (key, code, text, vk) = match name.to_lowercase().as_str() {
            "enter" | "return" => ("Enter", "Enter", "\r", 13),
            "tab" => ("Tab", "Tab", "\t", 9),
            "escape" | "esc" => ("Escape", "Escape", "", 27),
            "backspace" => ("Backspace", "Backspace", "", 8),
            "delete" => ("Delete", "Delete", "", 46),
            "arrowup" | "up" => ("ArrowUp", "ArrowUp", "", 38),
            "arrowdown" | "down" => ("ArrowDown", "ArrowDown", "", 40),
            "arrowleft" | "left" => ("ArrowLeft", "ArrowLeft", "", 37),
            "arrowright" | "right" => ("ArrowRight", "ArrowRight", "", 39),
            "home" => ("Home", "Home", "", 36),
            "end" => ("End", "End", "", 35),
            "pageup" => ("PageUp", "PageUp", "", 33),
            "pagedown" => ("PageDown", "PageDown", "", 34),
            "space" => (" ", "Space", " ", 32),
            _ => (name, name, name, 0),
        };

        Self {
            key: key.to_string(),
            code: code.to_string(),
            text: text.to_string(),
            virtual_key_code: vk,
        }
    }
}
