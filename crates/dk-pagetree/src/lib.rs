//! Page-tree builder for DocKit documentation sites.
//!
//! Takes the resolved content file map produced by an external scanner
//! and emits an ordered tree of page, folder and separator nodes for
//! navigation UIs, optionally partitioned per language.
//!
//! # Architecture
//!
//! - [`SourceFile`] entries describe pages and `meta.json` files by
//!   virtual path
//! - [`PageTreeBuilder`] groups them into directories and applies the
//!   meta ordering rules (rest operator, exclusions, links, separators)
//! - [`IconResolver`] is the seam for mapping icon names to renderable
//!   identifiers
//!
//! # Example
//!
//! ```ignore
//! use dk_pagetree::{PageFile, PageTreeBuilder, SourceFile};
//!
//! let files = vec![
//!     SourceFile::Page(PageFile::new("guide/index.mdx", "Guide")),
//!     SourceFile::Page(PageFile::new("guide/setup.mdx", "Setup")),
//! ];
//! let tree = PageTreeBuilder::new().build(&files);
//! println!("{}", serde_json::to_string_pretty(&tree)?);
//! ```

mod builder;
mod file_map;
mod tree;

pub use builder::{IconResolver, PageTreeBuilder};
pub use file_map::{MetaData, MetaFile, PageFile, SourceFile};
pub use tree::{FolderNode, Node, PageNode, PageTree, SeparatorNode};
