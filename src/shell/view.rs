use crate::render::{Element, ElementId, ElementKind, ElementTree, ToggleKind};

/// One printed line of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub id: ElementId,
    pub depth: usize,
    pub focused: bool,
    pub heading: bool,
    pub text: String,
}

/// Flatten the tree into printable lines, depth-first.
pub fn view_lines(tree: &ElementTree) -> Vec<ViewLine> {
    let focused = tree.focused();
    tree.walk()
        .into_iter()
        .filter_map(|(id, depth)| {
            let element = tree.get(id)?;
            Some(ViewLine {
                id,
                depth,
                focused: focused == Some(id),
                heading: matches!(element.kind, ElementKind::Heading { .. }),
                text: describe(element),
            })
        })
        .collect()
}

/// Page title and location bar, then one line per element.
pub fn format_view(tree: &ElementTree, location: Option<&str>) -> String {
    let mut out = header(tree, location);
    for line in view_lines(tree) {
        out.push('\n');
        out.push_str(&format_line(&line));
    }
    out
}

pub fn header(tree: &ElementTree, location: Option<&str>) -> String {
    format!(
        "Title: {}\nURL:   {}",
        tree.title().unwrap_or(""),
        location.unwrap_or("")
    )
}

pub fn format_line(line: &ViewLine) -> String {
    format!(
        "{}{:>4} {}{}",
        if line.focused { ">" } else { " " },
        line.id.index(),
        "  ".repeat(line.depth),
        line.text
    )
}

fn describe(element: &Element) -> String {
    let text = element.text.as_deref().unwrap_or("");
    let mut out = match &element.kind {
        ElementKind::Text => text.to_string(),
        ElementKind::Heading { level } => format!("h{} {}", level, text),
        ElementKind::Link { long: true } => format!("link (long) {}", text),
        ElementKind::Toggle { kind, checked } => {
            let mark = match (kind, checked) {
                (ToggleKind::Checkbox, true) => "[x]",
                (ToggleKind::Checkbox, false) => "[ ]",
                (ToggleKind::Radio, true) => "(*)",
                (ToggleKind::Radio, false) => "( )",
            };
            format!("{} {}", mark, element.kind.tag())
        }
        ElementKind::TextInput { .. } => {
            let mut input = format!(
                "{} \"{}\"",
                element.kind.tag(),
                element.value.as_deref().unwrap_or("")
            );
            if let Some(placeholder) = &element.placeholder {
                input.push_str(&format!(" ({})", placeholder));
            }
            if let Some(selection) = element.selection {
                input.push_str(&format!(" [{}..{}]", selection.start, selection.end));
            }
            input
        }
        ElementKind::Select => match &element.value {
            Some(value) => format!("select = {}", value),
            None => "select".to_string(),
        },
        kind if text.is_empty() => kind.tag().to_string(),
        kind => format!("{} {}", kind.tag(), text),
    };

    if matches!(element.kind, ElementKind::TextInput { disabled: true, .. }) {
        out.push_str(" (disabled)");
    }
    if let Some(title) = &element.title {
        out.push_str(&format!(" (title: {})", title));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax::AccessibilityNode;
    use crate::render::{project, ProjectionOptions, Selection};

    fn page() -> ElementTree {
        let mut checkbox = AccessibilityNode::new("4", "checkbox", "Remember me");
        checkbox.checked = true;
        let mut heading = AccessibilityNode::new("2", "heading", "Welcome");
        heading.level = Some(1);
        let mut search = AccessibilityNode::new("5", "textbox", "Search").with_value("rust");
        search.editable = true;

        let root = AccessibilityNode::new("1", "RootWebArea", "Example").with_children(vec![
            heading,
            AccessibilityNode::new("3", "link", "Home"),
            checkbox,
            search,
        ]);
        project(&root, &ProjectionOptions::default())
    }

    #[test]
    fn header_shows_title_and_location() {
        let view = format_view(&page(), Some("https://example.com/"));
        let mut lines = view.lines();

        assert_eq!(lines.next(), Some("Title: Example"));
        assert_eq!(lines.next(), Some("URL:   https://example.com/"));
    }

    #[test]
    fn elements_are_described_by_kind() {
        let tree = page();
        let texts: Vec<String> = view_lines(&tree).into_iter().map(|l| l.text).collect();

        assert!(texts.contains(&"h1 Welcome".to_string()));
        assert!(texts.contains(&"link Home".to_string()));
        assert!(texts.contains(&"[x] checkbox".to_string()));
        assert!(texts.contains(&"label Remember me".to_string()));
        assert!(texts.iter().any(|t| t.starts_with("input \"rust\"")));
    }

    #[test]
    fn focused_input_shows_marker_and_selection() {
        let mut tree = page();
        let input = view_lines(&tree)
            .into_iter()
            .find(|l| l.text.starts_with("input"))
            .unwrap()
            .id;
        assert!(tree.select_range(input, Selection::new(1, 3)));

        let line = view_lines(&tree).into_iter().find(|l| l.id == input).unwrap();
        assert!(line.focused);
        assert!(line.text.contains("[1..3]"));
        assert!(format_line(&line).starts_with('>'));
    }
}
