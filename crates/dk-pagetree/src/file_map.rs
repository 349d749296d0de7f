//! Input model for the resolved content file map.
//!
//! The underlying file-system scanner is an external collaborator; it
//! delivers a flat list of [`SourceFile`] entries with virtual paths
//! relative to the content root (e.g. `guide/setup.mdx`,
//! `guide/meta.json`). Locale variants use a suffixed stem
//! (`setup.fr.mdx`, `meta.fr.json`).

use serde::Deserialize;

/// A page document in the content map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageFile {
    /// Virtual path relative to the content root, extension included.
    pub path: String,
    /// Display title, already resolved by the scanner.
    pub title: String,
    /// Icon name from frontmatter.
    pub icon: Option<String>,
}

impl PageFile {
    /// Page with no icon.
    #[must_use]
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            icon: None,
        }
    }

    /// Attach a frontmatter icon name.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Parsed `meta.json` contents for one directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaData {
    /// Folder display title; overrides the index page title.
    pub title: Option<String>,
    /// Folder icon name.
    pub icon: Option<String>,
    /// Explicit child ordering. See the builder docs for the entry
    /// grammar (`...`, `z...a`, `!name`, links, separators).
    pub pages: Option<Vec<String>>,
    /// Render the folder expanded by default.
    pub default_open: bool,
    /// Mark the folder as a root navigation group.
    pub root: bool,
}

/// A meta file in the content map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaFile {
    /// Virtual path, e.g. `guide/meta.json` or `guide/meta.fr.json`.
    pub path: String,
    /// Parsed contents.
    pub data: MetaData,
}

/// One entry of the resolved file map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceFile {
    Page(PageFile),
    Meta(MetaFile),
}
