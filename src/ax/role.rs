use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic role of an accessibility node.
///
/// The vocabulary is open: anything the renderer has no special case for is
/// kept verbatim in [`Role::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    PageRoot,
    Text,
    Link,
    Heading,
    Button,
    Radio,
    Checkbox,
    GenericContainer,
    ListMarker,
    Image,
    Listbox,
    Combobox,
    Textbox,
    Menu,
    MenuItem,
    Tab,
    Option,
    Other(String),
}

impl Role {
    /// Parse a role string as reported by Chrome's accessibility tree.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "RootWebArea" | "WebArea" => Role::PageRoot,
            "StaticText" | "text" => Role::Text,
            "link" => Role::Link,
            "heading" => Role::Heading,
            "button" => Role::Button,
            "radio" => Role::Radio,
            "checkbox" => Role::Checkbox,
            "GenericContainer" | "generic" => Role::GenericContainer,
            "ListMarker" => Role::ListMarker,
            "img" | "image" => Role::Image,
            "listbox" => Role::Listbox,
            "combobox" => Role::Combobox,
            "textbox" => Role::Textbox,
            "menu" => Role::Menu,
            "menuitem" => Role::MenuItem,
            "tab" => Role::Tab,
            "option" => Role::Option,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::PageRoot => "RootWebArea",
            Role::Text => "StaticText",
            Role::Link => "link",
            Role::Heading => "heading",
            Role::Button => "button",
            Role::Radio => "radio",
            Role::Checkbox => "checkbox",
            Role::GenericContainer => "generic",
            Role::ListMarker => "ListMarker",
            Role::Image => "img",
            Role::Listbox => "listbox",
            Role::Combobox => "combobox",
            Role::Textbox => "textbox",
            Role::Menu => "menu",
            Role::MenuItem => "menuitem",
            Role::Tab => "tab",
            Role::Option => "option",
            Role::Other(raw) => raw,
        }
    }

    /// Roles that become entries of a rendered select.
    pub fn is_choice(&self) -> bool {
        matches!(self, Role::MenuItem | Role::Option)
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Role::parse(&raw)
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::parse(raw)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
