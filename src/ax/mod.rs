//! Accessibility snapshot model shared by the provider and the renderer.

mod role;

pub use role::Role;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical node identifier assigned by the snapshot provider.
///
/// Stable for a node across snapshots of the same page state; used to carry
/// focus across re-renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to the real page node behind an accessibility node.
///
/// Only the snapshot provider looks inside; it may go stale after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(i64);

impl NodeHandle {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One node of an accessibility snapshot.
///
/// Absent boolean attributes deserialize as `false` and absent children as an
/// empty list, so equality never depends on how the provider spelled "nothing".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityNode {
    pub node_id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<NodeHandle>,

    pub role: Role,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub checked: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub editable: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub multiline: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AccessibilityNode>,
}

impl AccessibilityNode {
    pub fn new(node_id: impl Into<String>, role: impl Into<Role>, name: impl Into<String>) -> Self {
        Self {
            node_id: NodeId::new(node_id),
            handle: None,
            role: role.into(),
            name: name.into(),
            value: None,
            checked: false,
            disabled: false,
            editable: false,
            multiline: false,
            level: None,
            title: None,
            children: Vec::new(),
        }
    }

    pub fn with_handle(mut self, handle: NodeHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<AccessibilityNode>) -> Self {
        self.children = children;
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(AccessibilityNode::count).sum::<usize>()
    }
}
