use crate::ax::{AccessibilityNode, Role};

use super::element::{Element, ElementId, ElementKind, ElementTree, NodeBinding, ToggleKind};

/// Heading depth used when the snapshot omits `level`.
const DEFAULT_HEADING_LEVEL: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Links whose name is longer than this many characters get the long-link style.
    pub long_link_threshold: usize,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            long_link_threshold: 25,
        }
    }
}

/// Build a fresh element tree for a snapshot.
pub fn project(root: &AccessibilityNode, options: &ProjectionOptions) -> ElementTree {
    let mut tree = ElementTree::new();
    let mount = tree.root();
    walk(root, &mut tree, mount, options);
    tree
}

/// Render `node` into `parent`, then its children into whatever it created.
fn walk(
    node: &AccessibilityNode,
    tree: &mut ElementTree,
    parent: ElementId,
    options: &ProjectionOptions,
) {
    let name = node.name.as_str();

    let created = match &node.role {
        Role::PageRoot => {
            tree.set_title(name);
            None
        }
        Role::Text => Some(tree.append(parent, Element::new(ElementKind::Text).with_text(name))),
        Role::Link => {
            let long = name.chars().count() > options.long_link_threshold;
            Some(tree.append(
                parent,
                Element::new(ElementKind::Link { long }).with_text(name),
            ))
        }
        Role::Heading => {
            let level = node.level.unwrap_or(DEFAULT_HEADING_LEVEL);
            Some(tree.append(
                parent,
                Element::new(ElementKind::Heading { level }).with_text(name),
            ))
        }
        Role::Button => {
            let group = button_group(tree, parent);
            Some(tree.append(
                group,
                Element::new(ElementKind::Button { dropdown: false }).with_text(name),
            ))
        }
        Role::Radio | Role::Checkbox => {
            let kind = if node.role == Role::Radio {
                ToggleKind::Radio
            } else {
                ToggleKind::Checkbox
            };
            let input = tree.append(
                parent,
                Element::new(ElementKind::Toggle {
                    kind,
                    checked: node.checked,
                }),
            );
            tree.append(parent, Element::new(ElementKind::Label).with_text(name));
            Some(input)
        }
        Role::GenericContainer => Some(tree.append(
            parent,
            Element::new(ElementKind::Block { focusable: true }).with_text(name),
        )),
        Role::ListMarker => Some(tree.append(
            parent,
            Element::new(ElementKind::ListMarker).with_text(name),
        )),
        Role::Image => {
            let mut image = Element::new(ElementKind::Image).with_text(name);
            image.title = node.title.clone();
            Some(tree.append(parent, image))
        }
        Role::Listbox | Role::Combobox if !node.editable => Some(choice_list(node, tree, parent)),
        Role::Listbox | Role::Combobox | Role::Textbox => {
            let mut input = Element::new(ElementKind::TextInput {
                multiline: node.multiline,
                disabled: node.disabled,
            })
            .with_title(name);
            input.placeholder = Some(name.to_string());
            input.value = Some(node.value.clone().unwrap_or_default());
            Some(tree.append(parent, input))
        }
        Role::Menu => {
            let menu = tree.append(parent, Element::new(ElementKind::Menu));
            tree.append(menu, Element::new(ElementKind::Subheading).with_text(name));
            Some(menu)
        }
        Role::MenuItem => {
            let mut item = Element::new(ElementKind::MenuItem).with_title(name);
            if !node.has_children() {
                item.text = Some(name.to_string());
            }
            Some(tree.append(parent, item))
        }
        Role::Tab => {
            let mut tab = Element::new(ElementKind::Tab);
            if !node.has_children() {
                tab.text = Some(name.to_string());
            }
            Some(tree.append(parent, tab))
        }
        Role::Option | Role::Other(_) => Some(tree.append(
            parent,
            Element::new(ElementKind::Block { focusable: false })
                .with_text(format!("{}: {}", node.role, name)),
        )),
    };

    let Some(id) = created else {
        for child in &node.children {
            walk(child, tree, parent, options);
        }
        return;
    };

    let consumed_choices = tree
        .get_mut(id)
        .map(|element| {
            element.binding = Some(NodeBinding {
                node_id: node.node_id.clone(),
                handle: node.handle,
            });
            element.kind == ElementKind::Select
        })
        .unwrap_or(false);

    for child in &node.children {
        // A select already holds its choices as options.
        if consumed_choices && child.role.is_choice() {
            continue;
        }
        walk(child, tree, id, options);
    }
}

/// The parent's trailing button group, or a new one.
fn button_group(tree: &mut ElementTree, parent: ElementId) -> ElementId {
    match tree.last_child(parent) {
        Some(last) if tree.get(last).map(|e| &e.kind) == Some(&ElementKind::ButtonGroup) => last,
        _ => tree.append(parent, Element::new(ElementKind::ButtonGroup)),
    }
}

/// Non-editable listbox/combobox: a select when it has choices, a dropdown button otherwise.
fn choice_list(node: &AccessibilityNode, tree: &mut ElementTree, parent: ElementId) -> ElementId {
    if !node.children.iter().any(|c| c.role.is_choice()) {
        return tree.append(
            parent,
            Element::new(ElementKind::Button { dropdown: true }).with_text(&node.name),
        );
    }

    let mut select = Element::new(ElementKind::Select).with_title(&node.name);
    select.value = node.value.clone();
    let select = tree.append(parent, select);
    for choice in node.children.iter().filter(|c| c.role.is_choice()) {
        tree.append(
            select,
            Element::new(ElementKind::SelectOption).with_text(&choice.name),
        );
    }
    select
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax::NodeId;
    use serde_json::json;

    fn node(value: serde_json::Value) -> AccessibilityNode {
        serde_json::from_value(value).unwrap()
    }

    fn render(value: serde_json::Value) -> ElementTree {
        project(&node(value), &ProjectionOptions::default())
    }

    fn kinds(tree: &ElementTree, id: ElementId) -> Vec<ElementKind> {
        tree.children(id)
            .iter()
            .map(|&c| tree.get(c).unwrap().kind.clone())
            .collect()
    }

    fn text(tree: &ElementTree, id: ElementId) -> Option<&str> {
        tree.get(id).unwrap().text.as_deref()
    }

    #[test]
    fn page_root_sets_title_and_creates_nothing() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "RootWebArea",
            "name": "Example Domain",
            "children": [{ "nodeId": "2", "role": "StaticText", "name": "Hello" }]
        }));

        assert_eq!(tree.title(), Some("Example Domain"));
        assert_eq!(tree.len(), 1);
        let span = tree.children(tree.root())[0];
        assert_eq!(tree.get(span).unwrap().kind, ElementKind::Text);
        assert_eq!(text(&tree, span), Some("Hello"));
    }

    #[test]
    fn consecutive_buttons_share_a_group() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "RootWebArea",
            "name": "",
            "children": [
                { "nodeId": "2", "role": "button", "name": "A" },
                { "nodeId": "3", "role": "button", "name": "B" },
                { "nodeId": "4", "role": "heading", "name": "H", "level": 2 },
                { "nodeId": "5", "role": "button", "name": "C" }
            ]
        }));

        let root = tree.root();
        assert_eq!(
            kinds(&tree, root),
            vec![
                ElementKind::ButtonGroup,
                ElementKind::Heading { level: 2 },
                ElementKind::ButtonGroup
            ]
        );
        let groups = tree.children(root);
        let first: Vec<_> = tree.children(groups[0]).iter().map(|&b| text(&tree, b)).collect();
        let second: Vec<_> = tree.children(groups[2]).iter().map(|&b| text(&tree, b)).collect();
        assert_eq!(first, vec![Some("A"), Some("B")]);
        assert_eq!(second, vec![Some("C")]);
    }

    #[test]
    fn long_link_threshold_is_exclusive() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "RootWebArea",
            "name": "",
            "children": [
                { "nodeId": "2", "role": "link", "name": "a".repeat(25) },
                { "nodeId": "3", "role": "link", "name": "a".repeat(26) }
            ]
        }));

        assert_eq!(
            kinds(&tree, tree.root()),
            vec![
                ElementKind::Link { long: false },
                ElementKind::Link { long: true }
            ]
        );
    }

    #[test]
    fn long_link_threshold_is_configurable() {
        let options = ProjectionOptions {
            long_link_threshold: 3,
        };
        let tree = project(&AccessibilityNode::new("1", "link", "Home"), &options);
        let link = tree.children(tree.root())[0];
        assert_eq!(tree.get(link).unwrap().kind, ElementKind::Link { long: true });
    }

    #[test]
    fn combobox_with_options_renders_select() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "combobox",
            "name": "Size",
            "value": "X",
            "children": [{ "nodeId": "2", "role": "option", "name": "X" }]
        }));

        let select = tree.children(tree.root())[0];
        let element = tree.get(select).unwrap();
        assert_eq!(element.kind, ElementKind::Select);
        assert_eq!(element.title.as_deref(), Some("Size"));
        assert_eq!(element.value.as_deref(), Some("X"));
        assert_eq!(kinds(&tree, select), vec![ElementKind::SelectOption]);
        assert_eq!(text(&tree, tree.children(select)[0]), Some("X"));
    }

    #[test]
    fn combobox_without_options_renders_dropdown_button() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "combobox",
            "name": "Size",
            "children": [{ "nodeId": "2", "role": "generic", "name": "" }]
        }));

        let button = tree.children(tree.root())[0];
        assert_eq!(
            tree.get(button).unwrap().kind,
            ElementKind::Button { dropdown: true }
        );
        assert_eq!(text(&tree, button), Some("Size"));
        // Non-choice children still render, inside the button.
        assert_eq!(kinds(&tree, button), vec![ElementKind::Block { focusable: true }]);
    }

    #[test]
    fn select_keeps_non_choice_children() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "listbox",
            "name": "Fruit",
            "children": [
                { "nodeId": "2", "role": "menuitem", "name": "Apple" },
                { "nodeId": "3", "role": "StaticText", "name": "hint" },
                { "nodeId": "4", "role": "option", "name": "Pear" }
            ]
        }));

        let select = tree.children(tree.root())[0];
        assert_eq!(
            kinds(&tree, select),
            vec![
                ElementKind::SelectOption,
                ElementKind::SelectOption,
                ElementKind::Text
            ]
        );
    }

    #[test]
    fn editable_combobox_renders_text_input() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "combobox",
            "name": "Search",
            "editable": true,
            "value": "rust",
            "children": [{ "nodeId": "2", "role": "option", "name": "rustc" }]
        }));

        let input = tree.children(tree.root())[0];
        let element = tree.get(input).unwrap();
        assert_eq!(
            element.kind,
            ElementKind::TextInput {
                multiline: false,
                disabled: false
            }
        );
        assert_eq!(element.value.as_deref(), Some("rust"));
        assert_eq!(element.placeholder.as_deref(), Some("Search"));
        assert_eq!(element.title.as_deref(), Some("Search"));
    }

    #[test]
    fn textbox_attributes_carry_over() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "textbox",
            "name": "Comment",
            "multiline": true,
            "disabled": true
        }));

        let input = tree.get(tree.children(tree.root())[0]).unwrap();
        assert_eq!(
            input.kind,
            ElementKind::TextInput {
                multiline: true,
                disabled: true
            }
        );
        assert_eq!(input.value.as_deref(), Some(""));
    }

    #[test]
    fn checkbox_and_radio_render_input_plus_label() {
        for role in ["checkbox", "radio"] {
            let tree = render(json!({
                "nodeId": "1",
                "role": "RootWebArea",
                "name": "",
                "children": [{ "nodeId": "2", "role": role, "name": "Remember me", "checked": true }]
            }));

            let top = tree.children(tree.root());
            assert_eq!(top.len(), 2, "{role} should render two siblings");
            let input = tree.get(top[0]).unwrap();
            assert!(matches!(input.kind, ElementKind::Toggle { checked: true, .. }));
            assert_eq!(input.node_id(), Some(&NodeId::from("2")));
            let label = tree.get(top[1]).unwrap();
            assert_eq!(label.kind, ElementKind::Label);
            assert_eq!(label.text.as_deref(), Some("Remember me"));
        }
    }

    #[test]
    fn menu_gets_subheading_before_items() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "menu",
            "name": "File",
            "children": [
                { "nodeId": "2", "role": "menuitem", "name": "Open" },
                {
                    "nodeId": "3",
                    "role": "menuitem",
                    "name": "Recent",
                    "children": [{ "nodeId": "4", "role": "menuitem", "name": "a.txt" }]
                }
            ]
        }));

        let menu = tree.children(tree.root())[0];
        assert_eq!(
            kinds(&tree, menu),
            vec![
                ElementKind::Subheading,
                ElementKind::MenuItem,
                ElementKind::MenuItem
            ]
        );
        let items = tree.children(menu);
        assert_eq!(text(&tree, items[0]), Some("File"));
        assert_eq!(text(&tree, items[1]), Some("Open"));
        // Items with children keep only the title.
        assert_eq!(text(&tree, items[2]), None);
        assert_eq!(tree.get(items[2]).unwrap().title.as_deref(), Some("Recent"));
        assert_eq!(tree.children(items[2]).len(), 1);
    }

    #[test]
    fn tab_text_depends_on_children() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "tablist",
            "name": "",
            "children": [
                { "nodeId": "2", "role": "tab", "name": "One" },
                {
                    "nodeId": "3",
                    "role": "tab",
                    "name": "Two",
                    "children": [{ "nodeId": "4", "role": "StaticText", "name": "Two" }]
                }
            ]
        }));

        let list = tree.children(tree.root())[0];
        let tabs = tree.children(list);
        assert_eq!(text(&tree, tabs[0]), Some("One"));
        assert_eq!(text(&tree, tabs[1]), None);
    }

    #[test]
    fn image_uses_title_as_tooltip() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "img",
            "name": "Logo",
            "title": "Company logo"
        }));

        let image = tree.get(tree.children(tree.root())[0]).unwrap();
        assert_eq!(image.kind, ElementKind::Image);
        assert_eq!(image.text.as_deref(), Some("Logo"));
        assert_eq!(image.title.as_deref(), Some("Company logo"));
    }

    #[test]
    fn unknown_role_falls_back_to_labeled_block() {
        let tree = render(json!({ "nodeId": "1", "role": "slider", "name": "Volume" }));
        let block = tree.get(tree.children(tree.root())[0]).unwrap();
        assert_eq!(block.kind, ElementKind::Block { focusable: false });
        assert_eq!(block.text.as_deref(), Some("slider: Volume"));
    }

    #[test]
    fn every_role_binds_exactly_one_element() {
        let roles = [
            "StaticText",
            "link",
            "heading",
            "button",
            "radio",
            "checkbox",
            "generic",
            "ListMarker",
            "img",
            "listbox",
            "combobox",
            "textbox",
            "menu",
            "menuitem",
            "tab",
            "option",
            "treegrid",
            "",
            "definitely-not-a-role",
        ];

        for role in roles {
            let tree = project(
                &AccessibilityNode::new("9", role, "x"),
                &ProjectionOptions::default(),
            );
            let bound = tree
                .walk()
                .into_iter()
                .filter(|&(id, _)| tree.get(id).unwrap().node_id() == Some(&NodeId::from("9")))
                .count();
            assert_eq!(bound, 1, "role {role:?}");
        }

        let tree = project(
            &AccessibilityNode::new("9", "RootWebArea", "x"),
            &ProjectionOptions::default(),
        );
        assert!(tree.is_empty());
    }

    #[test]
    fn children_render_inside_created_element() {
        let tree = render(json!({
            "nodeId": "1",
            "role": "link",
            "name": "Docs",
            "handle": 12,
            "children": [{ "nodeId": "2", "role": "StaticText", "name": "Docs" }]
        }));

        let link = tree.children(tree.root())[0];
        let binding = tree.get(link).unwrap().binding.clone().unwrap();
        assert_eq!(binding.handle, Some(crate::ax::NodeHandle::new(12)));
        assert_eq!(kinds(&tree, link), vec![ElementKind::Text]);
    }
}
