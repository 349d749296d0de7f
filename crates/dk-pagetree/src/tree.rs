//! Page tree node types.
//!
//! The ordered hierarchy the builder emits for navigation UIs. Nodes
//! serialize with a `type` tag so a rendering collaborator can consume
//! the tree as JSON.

use serde::Serialize;

/// A node of the page tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Page(PageNode),
    Folder(FolderNode),
    Separator(SeparatorNode),
}

/// A page link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageNode {
    /// Display title.
    pub name: String,
    /// Link target.
    pub url: String,
    /// Resolved icon identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// True for link entries pointing outside the site.
    pub external: bool,
}

/// A folder with ordered children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    /// Display title.
    pub name: String,
    /// Resolved icon identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// The folder's landing page, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<PageNode>,
    /// Render expanded by default.
    #[serde(rename = "defaultOpen")]
    pub default_open: bool,
    /// Root navigation group.
    pub root: bool,
    /// Ordered children.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// A visual separator between sibling entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeparatorNode {
    /// Separator label; may be empty.
    pub name: String,
}

/// The built page tree for one language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageTree {
    /// Tree title, from the root meta or index page.
    pub name: String,
    /// Ordered root-level nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_serialization_is_tagged() {
        let node = Node::Page(PageNode {
            name: "Setup".to_owned(),
            url: "/guide/setup".to_owned(),
            icon: None,
            external: false,
        });

        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "page",
                "name": "Setup",
                "url": "/guide/setup",
                "external": false,
            })
        );
    }

    #[test]
    fn test_separator_serialization() {
        let node = Node::Separator(SeparatorNode {
            name: "Advanced".to_owned(),
        });

        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"type": "separator", "name": "Advanced"})
        );
    }
}
