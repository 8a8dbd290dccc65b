use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ax::{NodeHandle, NodeId};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Index of an element inside one [`ElementTree`], stamped with that tree's
/// generation.
///
/// Every rebuild starts numbering again from the root, so an id taken from an
/// older tree never resolves in a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    generation: u64,
    index: usize,
}

impl ElementId {
    /// The element at `index` in the tree with the given generation.
    pub fn new(generation: u64, index: usize) -> Self {
        Self { generation, index }
    }

    pub fn generation(self) -> u64 {
        self.generation
    }

    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleKind {
    Radio,
    Checkbox,
}

/// Concrete shape of a rendered element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Mount point every render pass starts from.
    Container,
    Text,
    Link { long: bool },
    Heading { level: u32 },
    ButtonGroup,
    Button { dropdown: bool },
    Toggle { kind: ToggleKind, checked: bool },
    Label,
    Block { focusable: bool },
    ListMarker,
    Image,
    Select,
    SelectOption,
    TextInput { multiline: bool, disabled: bool },
    Menu,
    Subheading,
    MenuItem,
    Tab,
}

impl ElementKind {
    /// Elements that carry a caret and a selection range.
    pub fn is_text_input(&self) -> bool {
        matches!(self, ElementKind::TextInput { .. })
    }

    /// Elements whose value the user can change.
    pub fn accepts_input(&self) -> bool {
        matches!(self, ElementKind::TextInput { disabled: false, .. } | ElementKind::Select)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Container => "container",
            ElementKind::Text => "text",
            ElementKind::Link { .. } => "link",
            ElementKind::Heading { .. } => "heading",
            ElementKind::ButtonGroup => "button-group",
            ElementKind::Button { dropdown: true } => "dropdown",
            ElementKind::Button { dropdown: false } => "button",
            ElementKind::Toggle {
                kind: ToggleKind::Radio,
                ..
            } => "radio",
            ElementKind::Toggle {
                kind: ToggleKind::Checkbox,
                ..
            } => "checkbox",
            ElementKind::Label => "label",
            ElementKind::Block { .. } => "block",
            ElementKind::ListMarker => "list-marker",
            ElementKind::Image => "image",
            ElementKind::Select => "select",
            ElementKind::SelectOption => "option",
            ElementKind::TextInput {
                multiline: true, ..
            } => "textarea",
            ElementKind::TextInput { .. } => "input",
            ElementKind::Menu => "menu",
            ElementKind::Subheading => "subheading",
            ElementKind::MenuItem => "menuitem",
            ElementKind::Tab => "tab",
        }
    }
}

/// Selection range inside a text input, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    fn clamp(self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
        }
    }
}

/// Link from a rendered element back to the accessibility node it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBinding {
    pub node_id: NodeId,
    pub handle: Option<NodeHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub text: Option<String>,
    pub title: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub selection: Option<Selection>,
    pub binding: Option<NodeBinding>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            text: None,
            title: None,
            placeholder: None,
            value: None,
            selection: None,
            binding: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Source node id, if this element was bound to one.
    pub fn node_id(&self) -> Option<&NodeId> {
        self.binding.as_ref().map(|b| &b.node_id)
    }
}

/// Focus state carried across a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSnapshot {
    pub node_id: NodeId,
    pub selection: Option<Selection>,
}

/// Arena of rendered elements rooted at a single container.
#[derive(Debug, Clone)]
pub struct ElementTree {
    generation: u64,
    elements: Vec<Element>,
    title: Option<String>,
    focused: Option<ElementId>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            elements: vec![Element::new(ElementKind::Container)],
            title: None,
            focused: None,
        }
    }

    pub fn root(&self) -> ElementId {
        self.id(0)
    }

    /// Distinguishes this tree from every other one built in the process.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn id(&self, index: usize) -> ElementId {
        ElementId::new(self.generation, index)
    }

    /// Arena slot for `id`, if it belongs to this tree.
    fn slot(&self, id: ElementId) -> Option<usize> {
        (id.generation == self.generation && id.index < self.elements.len()).then_some(id.index)
    }

    /// Number of elements, not counting the root container.
    pub fn len(&self) -> usize {
        self.elements.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.slot(id).and_then(|slot| self.elements.get(slot))
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.slot(id).and_then(|slot| self.elements.get_mut(slot))
    }

    /// Append `element` as the last child of `parent`.
    pub fn append(&mut self, parent: ElementId, mut element: Element) -> ElementId {
        let id = self.id(self.elements.len());
        element.parent = Some(parent);
        element.children.clear();
        self.elements.push(element);
        if let Some(parent) = self.get_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(Element::children).unwrap_or(&[])
    }

    pub fn last_child(&self, id: ElementId) -> Option<ElementId> {
        self.children(id).last().copied()
    }

    /// Depth-first walk below the root, yielding each element with its depth.
    pub fn walk(&self) -> Vec<(ElementId, usize)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(ElementId, usize)> = self
            .children(self.root())
            .iter()
            .rev()
            .map(|&id| (id, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for &child in self.children(id).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// Focus an element. Returns false when the id is not in this tree.
    pub fn focus(&mut self, id: ElementId) -> bool {
        if id == self.root() || self.get(id).is_none() {
            return false;
        }
        self.focused = Some(id);
        true
    }

    /// Focus a text input and set its selection range.
    pub fn select_range(&mut self, id: ElementId, selection: Selection) -> bool {
        let Some(element) = self.get_mut(id) else {
            return false;
        };
        if !element.kind.is_text_input() {
            return false;
        }
        let len = element.value.as_deref().map_or(0, |v| v.chars().count());
        element.selection = Some(selection.clamp(len));
        self.focused = Some(id);
        true
    }

    pub fn find_by_node_id(&self, node_id: &NodeId) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.node_id() == Some(node_id))
            .map(|index| self.id(index))
    }

    /// Record which source node holds focus, and its selection if it is a text input.
    pub fn capture_focus(&self) -> Option<FocusSnapshot> {
        let element = self.get(self.focused?)?;
        let node_id = element.node_id()?.clone();
        let selection = if element.kind.is_text_input() {
            element.selection
        } else {
            None
        };
        Some(FocusSnapshot { node_id, selection })
    }

    /// Re-focus the element rendered from the same node, if this tree has one.
    pub fn restore_focus(&mut self, snapshot: &FocusSnapshot) -> bool {
        let Some(id) = self.find_by_node_id(&snapshot.node_id) else {
            return false;
        };
        self.focused = Some(id);
        if let Some(selection) = snapshot.selection {
            self.select_range(id, selection);
        }
        true
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}
