//! Folding of the raw CDP accessibility tree into an [`AccessibilityNode`].
//!
//! `Accessibility.getFullAXTree` returns every node in the page, including
//! ignored wrappers and inline text boxes. Only "interesting" nodes survive;
//! the rest are dropped and their interesting descendants hoisted into the
//! nearest kept ancestor.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::ax::{AccessibilityNode, NodeHandle, NodeId, Role};
use crate::error::{AxviewError, Result};

/// One entry of `Accessibility.getFullAXTree`, as much of it as we read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAxNode {
    pub node_id: String,
    #[serde(default)]
    pub ignored: bool,
    pub role: Option<RawAxValue>,
    pub name: Option<RawAxValue>,
    pub description: Option<RawAxValue>,
    pub value: Option<RawAxValue>,
    pub properties: Option<Vec<RawAxProperty>>,
    pub child_ids: Option<Vec<String>>,
    #[serde(rename = "backendDOMNodeId")]
    pub backend_dom_node_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAxValue {
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAxProperty {
    pub name: String,
    pub value: RawAxValue,
}

impl RawAxValue {
    fn as_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

const CONTROL_ROLES: &[&str] = &[
    "button",
    "checkbox",
    "ColorWell",
    "combobox",
    "DisclosureTriangle",
    "listbox",
    "menu",
    "menubar",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "radio",
    "scrollbar",
    "searchbox",
    "slider",
    "spinbutton",
    "switch",
    "tab",
    "textbox",
    "tree",
    "treeitem",
];

const LEAF_ROLES: &[&str] = &[
    "doc-cover",
    "graphics-document",
    "img",
    "image",
    "meter",
    "scrollbar",
    "slider",
    "separator",
    "progressbar",
];

const TEXT_ROLES: &[&str] = &["LineBreak", "text", "InlineTextBox", "StaticText"];

/// Attributes of a raw node that the folding rules look at.
struct Facts<'a> {
    raw: &'a RawAxNode,
    role: String,
    name: String,
    focusable: bool,
    editable: Option<String>,
    children: Vec<usize>,
}

impl Facts<'_> {
    fn property(raw: &RawAxNode, name: &str) -> Option<Value> {
        raw.properties
            .as_deref()?
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.value.clone())
    }

    fn is_true(raw: &RawAxNode, name: &str) -> bool {
        match Self::property(raw, name) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    fn is_control(&self) -> bool {
        CONTROL_ROLES.contains(&self.role.as_str())
    }

    fn richly_editable(&self) -> bool {
        self.editable.as_deref() == Some("richtext")
    }

    fn is_plain_text_field(&self) -> bool {
        if self.richly_editable() {
            return false;
        }
        self.editable.is_some() || matches!(self.role.as_str(), "textbox" | "searchbox")
    }

    fn is_text_only(&self) -> bool {
        TEXT_ROLES.contains(&self.role.as_str())
    }
}

struct Folder<'a> {
    nodes: Vec<Facts<'a>>,
    interesting: HashSet<usize>,
}

/// Fold the flat `getFullAXTree` node list into a tree of interesting nodes.
///
/// The first node is the page root and is always kept.
pub fn fold_snapshot(raw: &[RawAxNode]) -> Result<AccessibilityNode> {
    if raw.is_empty() {
        return Err(AxviewError::bridge(
            "fetch_snapshot",
            "accessibility tree is empty",
        ));
    }

    let index: HashMap<&str, usize> = raw
        .iter()
        .enumerate()
        .map(|(i, node)| (node.node_id.as_str(), i))
        .collect();

    let nodes = raw
        .iter()
        .map(|node| Facts {
            raw: node,
            role: node
                .role
                .as_ref()
                .and_then(RawAxValue::as_text)
                .unwrap_or_default(),
            name: node
                .name
                .as_ref()
                .and_then(RawAxValue::as_text)
                .unwrap_or_default(),
            focusable: Facts::is_true(node, "focusable"),
            editable: match Facts::property(node, "editable") {
                None | Some(Value::Null) | Some(Value::Bool(false)) => None,
                Some(Value::String(s)) if s == "false" => None,
                Some(Value::String(s)) => Some(s),
                Some(other) => Some(other.to_string()),
            },
            children: node
                .child_ids
                .as_deref()
                .unwrap_or_default()
                .iter()
                .filter_map(|id| index.get(id.as_str()).copied())
                .filter(|&i| {
                    raw[i].role.as_ref().and_then(RawAxValue::as_text).as_deref()
                        != Some("InlineTextBox")
                })
                .collect(),
        })
        .collect();

    let mut folder = Folder {
        nodes,
        interesting: HashSet::new(),
    };
    let mut seen = HashSet::new();
    folder.collect_interesting(0, false, &mut seen);
    folder.interesting.insert(0);

    let mut seen = HashSet::new();
    let mut root = folder.serialize(0, &mut seen);
    match root.pop() {
        Some(node) => Ok(node),
        None => Err(AxviewError::bridge(
            "fetch_snapshot",
            "page root was folded away",
        )),
    }
}

impl Folder<'_> {
    fn has_focusable_descendant(&self, index: usize, seen: &mut HashSet<usize>) -> bool {
        self.nodes[index].children.iter().any(|&child| {
            seen.insert(child)
                && (self.nodes[child].focusable || self.has_focusable_descendant(child, seen))
        })
    }

    fn is_leaf(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        if node.children.is_empty() || node.is_plain_text_field() || node.is_text_only() {
            return true;
        }
        if LEAF_ROLES.contains(&node.role.as_str()) {
            return true;
        }
        if self.has_focusable_descendant(index, &mut HashSet::new()) {
            return false;
        }
        if node.focusable && !node.name.is_empty() {
            return true;
        }
        node.role == "heading" && !node.name.is_empty()
    }

    fn is_interesting(&self, index: usize, inside_control: bool) -> bool {
        let node = &self.nodes[index];
        if node.raw.ignored {
            return false;
        }
        if node.focusable || node.richly_editable() || node.is_control() {
            return true;
        }
        if inside_control {
            return false;
        }
        self.is_leaf(index) && !node.name.is_empty()
    }

    fn collect_interesting(&mut self, index: usize, inside_control: bool, seen: &mut HashSet<usize>) {
        if !seen.insert(index) {
            return;
        }
        if self.is_interesting(index, inside_control) {
            self.interesting.insert(index);
        }
        if self.is_leaf(index) {
            return;
        }
        let inside_control = inside_control || self.nodes[index].is_control();
        for child in self.nodes[index].children.clone() {
            self.collect_interesting(child, inside_control, seen);
        }
    }

    /// Kept nodes come back as one element; dropped nodes return their kept descendants.
    fn serialize(&self, index: usize, seen: &mut HashSet<usize>) -> Vec<AccessibilityNode> {
        if !seen.insert(index) {
            return Vec::new();
        }
        let children: Vec<AccessibilityNode> = self.nodes[index]
            .children
            .iter()
            .flat_map(|&child| self.serialize(child, seen))
            .collect();

        if !self.interesting.contains(&index) {
            return children;
        }

        let mut node = self.to_node(index);
        node.children = children;
        vec![node]
    }

    fn to_node(&self, index: usize) -> AccessibilityNode {
        let facts = &self.nodes[index];
        let raw = facts.raw;
        let text = |value: &Option<RawAxValue>| {
            value
                .as_ref()
                .and_then(RawAxValue::as_text)
                .filter(|s| !s.is_empty())
        };

        AccessibilityNode {
            node_id: NodeId::new(raw.node_id.clone()),
            handle: raw.backend_dom_node_id.map(NodeHandle::new),
            role: Role::parse(&facts.role),
            name: facts.name.clone(),
            value: if index == 0 { None } else { text(&raw.value) },
            checked: Facts::is_true(raw, "checked"),
            disabled: Facts::is_true(raw, "disabled"),
            editable: facts.editable.is_some(),
            multiline: Facts::is_true(raw, "multiline"),
            level: Facts::property(raw, "level")
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok()),
            title: text(&raw.description),
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(nodes: Value) -> Vec<RawAxNode> {
        serde_json::from_value(nodes).unwrap()
    }

    fn page() -> Vec<RawAxNode> {
        parse(json!([
            {
                "nodeId": "1", "ignored": false, "backendDOMNodeId": 10,
                "role": { "type": "internalRole", "value": "RootWebArea" },
                "name": { "type": "computedString", "value": "Example" },
                "properties": [{ "name": "focusable", "value": { "type": "booleanOrUndefined", "value": true } }],
                "childIds": ["2"]
            },
            {
                "nodeId": "2", "ignored": true, "backendDOMNodeId": 11, "parentId": "1",
                "role": { "type": "role", "value": "none" },
                "childIds": ["3", "5", "7", "9"]
            },
            {
                "nodeId": "3", "ignored": false, "backendDOMNodeId": 12, "parentId": "2",
                "role": { "type": "role", "value": "heading" },
                "name": { "type": "computedString", "value": "Welcome" },
                "properties": [{ "name": "level", "value": { "type": "integer", "value": 1 } }],
                "childIds": ["4"]
            },
            {
                "nodeId": "4", "ignored": false, "parentId": "3",
                "role": { "type": "internalRole", "value": "StaticText" },
                "name": { "type": "computedString", "value": "Welcome" },
                "childIds": []
            },
            {
                "nodeId": "5", "ignored": false, "backendDOMNodeId": 14, "parentId": "2",
                "role": { "type": "role", "value": "checkbox" },
                "name": { "type": "computedString", "value": "Remember me" },
                "description": { "type": "computedString", "value": "Stay signed in" },
                "properties": [
                    { "name": "focusable", "value": { "type": "booleanOrUndefined", "value": true } },
                    { "name": "checked", "value": { "type": "tristate", "value": "true" } }
                ],
                "childIds": ["6"]
            },
            {
                "nodeId": "6", "ignored": false, "parentId": "5",
                "role": { "type": "internalRole", "value": "InlineTextBox" },
                "childIds": []
            },
            {
                "nodeId": "7", "ignored": false, "backendDOMNodeId": 16, "parentId": "2",
                "role": { "type": "role", "value": "textbox" },
                "name": { "type": "computedString", "value": "Search" },
                "value": { "type": "string", "value": "rust" },
                "properties": [
                    { "name": "focusable", "value": { "type": "booleanOrUndefined", "value": true } },
                    { "name": "editable", "value": { "type": "token", "value": "plaintext" } },
                    { "name": "multiline", "value": { "type": "boolean", "value": false } }
                ],
                "childIds": ["8"]
            },
            {
                "nodeId": "8", "ignored": false, "parentId": "7",
                "role": { "type": "generic", "value": "generic" },
                "childIds": []
            },
            {
                "nodeId": "9", "ignored": false, "backendDOMNodeId": 18, "parentId": "2",
                "role": { "type": "role", "value": "generic" },
                "childIds": []
            }
        ]))
    }

    #[test]
    fn ignored_wrappers_are_hoisted_away() {
        let root = fold_snapshot(&page()).unwrap();

        assert_eq!(root.role, Role::PageRoot);
        assert_eq!(root.handle, Some(NodeHandle::new(10)));
        let ids: Vec<&str> = root.children.iter().map(|c| c.node_id.as_str()).collect();
        assert_eq!(ids, ["3", "5", "7"]);
    }

    #[test]
    fn named_heading_is_a_leaf_with_level() {
        let root = fold_snapshot(&page()).unwrap();
        let heading = &root.children[0];

        assert_eq!(heading.role, Role::Heading);
        assert_eq!(heading.level, Some(1));
        assert!(heading.children.is_empty());
    }

    #[test]
    fn control_attributes_are_read_from_properties() {
        let root = fold_snapshot(&page()).unwrap();
        let checkbox = &root.children[1];
        let textbox = &root.children[2];

        assert!(checkbox.checked);
        assert_eq!(checkbox.title.as_deref(), Some("Stay signed in"));
        assert!(checkbox.children.is_empty());

        assert!(textbox.editable);
        assert!(!textbox.multiline);
        assert_eq!(textbox.value.as_deref(), Some("rust"));
        assert!(textbox.children.is_empty());
    }

    #[test]
    fn folding_is_deterministic() {
        assert_eq!(fold_snapshot(&page()).unwrap(), fold_snapshot(&page()).unwrap());
    }

    #[test]
    fn text_inside_a_named_button_is_dropped() {
        let nodes = parse(json!([
            {
                "nodeId": "1", "role": { "value": "RootWebArea" }, "childIds": ["2"]
            },
            {
                "nodeId": "2", "role": { "value": "button" },
                "name": { "value": "Go" }, "childIds": ["3"],
                "properties": [{ "name": "focusable", "value": { "value": true } }]
            },
            {
                "nodeId": "3", "role": { "value": "StaticText" },
                "name": { "value": "Go" }, "childIds": []
            }
        ]));

        let root = fold_snapshot(&nodes).unwrap();
        assert_eq!(root.children.len(), 1);
        assert!(root.children[0].children.is_empty());
    }

    #[test]
    fn empty_tree_is_a_bridge_error() {
        assert!(fold_snapshot(&[]).unwrap_err().is_bridge_failure());
    }
}
