//! Page tree construction from a resolved file map.
//!
//! # Ordering
//!
//! Without a meta file, a folder's children are its pages and subfolders
//! sorted by file name. A meta file with a `pages` list takes over
//! completely; each entry is one of:
//!
//! - `"name"`: the page or subfolder with that file name
//! - `"..."`: every remaining child, name-sorted
//! - `"z...a"`: every remaining child, reverse name-sorted
//! - `"!name"`: exclude `name` from the rest operator
//! - `"[Label](url)"`: an external link entry
//! - `"---Label---"`: a separator entry
//!
//! Entries that match nothing are skipped with a warning; one bad entry
//! never fails the whole build.
//!
//! # Languages
//!
//! [`PageTreeBuilder::build_all`] emits one tree per configured language.
//! A locale-suffixed file (`setup.fr.mdx`, `meta.fr.json`) overrides the
//! default-locale file in that language's tree; languages without a
//! localized variant fall back to the default file. Localized URLs are
//! prefixed with the language code.

use std::collections::{BTreeMap, BTreeSet};

use crate::file_map::{MetaData, PageFile, SourceFile};
use crate::tree::{FolderNode, Node, PageNode, PageTree, SeparatorNode};

/// Resolves icon names from frontmatter and meta files to renderable
/// identifiers.
///
/// Without a resolver, icon names pass through unresolved so a rendering
/// layer can still map them. With one, the resolver's answer is
/// authoritative: `None` drops the icon.
pub trait IconResolver {
    fn resolve(&self, icon: &str) -> Option<String>;
}

/// Builds page trees from a resolved file map.
#[derive(Default)]
pub struct PageTreeBuilder {
    languages: Vec<String>,
    resolver: Option<Box<dyn IconResolver>>,
}

impl PageTreeBuilder {
    /// Builder with no configured languages or icon resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Language codes recognized as locale suffixes in file stems.
    #[must_use]
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an icon resolver.
    #[must_use]
    pub fn with_icon_resolver(mut self, resolver: Box<dyn IconResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Build the default-locale tree.
    #[must_use]
    pub fn build(&self, files: &[SourceFile]) -> PageTree {
        self.build_locale(files, None)
    }

    /// Build one tree per configured language.
    #[must_use]
    pub fn build_all(&self, files: &[SourceFile]) -> BTreeMap<String, PageTree> {
        self.languages
            .iter()
            .map(|language| {
                (
                    language.clone(),
                    self.build_locale(files, Some(language)),
                )
            })
            .collect()
    }

    fn build_locale(&self, files: &[SourceFile], locale: Option<&str>) -> PageTree {
        let root = group_files(files, &self.languages);
        let name = root
            .meta(locale)
            .and_then(|meta| meta.title.clone())
            .or_else(|| {
                root.localized_page("index", locale)
                    .map(|page| page.title.clone())
            })
            .unwrap_or_default();
        let children = self.folder_children(&root, &[], locale);
        PageTree { name, children }
    }

    fn folder_node(
        &self,
        dir: &Directory,
        segments: &[&str],
        segment: &str,
        locale: Option<&str>,
    ) -> FolderNode {
        let meta = dir.meta(locale);
        let index = dir
            .localized_page("index", locale)
            .map(|page| self.page_node(page, segments, "index", locale));

        let name = meta
            .and_then(|meta| meta.title.clone())
            .or_else(|| index.as_ref().map(|page| page.name.clone()))
            .unwrap_or_else(|| path_to_name(segment));

        FolderNode {
            name,
            icon: self.resolve_icon(meta.and_then(|meta| meta.icon.as_deref())),
            index,
            default_open: meta.is_some_and(|meta| meta.default_open),
            root: meta.is_some_and(|meta| meta.root),
            children: self.folder_children(dir, segments, locale),
        }
    }

    fn folder_children(
        &self,
        dir: &Directory,
        segments: &[&str],
        locale: Option<&str>,
    ) -> Vec<Node> {
        match dir.meta(locale).and_then(|meta| meta.pages.as_ref()) {
            Some(order) => self.ordered_children(dir, segments, locale, order),
            None => {
                let empty = BTreeSet::new();
                self.rest_children(dir, segments, locale, &empty, false)
            }
        }
    }

    fn ordered_children(
        &self,
        dir: &Directory,
        segments: &[&str],
        locale: Option<&str>,
        order: &[String],
    ) -> Vec<Node> {
        // Names claimed by literal entries or exclusions never reappear
        // through the rest operator, regardless of entry order.
        let mut used: BTreeSet<&str> = BTreeSet::new();
        for entry in order {
            match parse_meta_entry(entry) {
                MetaEntry::Item(name) | MetaEntry::Exclude(name) => {
                    used.insert(name);
                }
                _ => {}
            }
        }

        let mut nodes = Vec::new();
        for entry in order {
            match parse_meta_entry(entry) {
                MetaEntry::Rest => {
                    nodes.extend(self.rest_children(dir, segments, locale, &used, false));
                }
                MetaEntry::RestReversed => {
                    nodes.extend(self.rest_children(dir, segments, locale, &used, true));
                }
                MetaEntry::Exclude(_) => {}
                MetaEntry::Separator(name) => {
                    nodes.push(Node::Separator(SeparatorNode {
                        name: name.to_owned(),
                    }));
                }
                MetaEntry::Link { name, url } => {
                    nodes.push(Node::Page(PageNode {
                        name: name.to_owned(),
                        url: url.to_owned(),
                        icon: None,
                        external: url.contains("://"),
                    }));
                }
                MetaEntry::Item(name) => {
                    if let Some(page) = dir.localized_page(name, locale) {
                        nodes.push(Node::Page(self.page_node(page, segments, name, locale)));
                    } else if let Some(sub) = dir.dirs.get(name) {
                        let mut child_segments = segments.to_vec();
                        child_segments.push(name);
                        nodes.push(Node::Folder(self.folder_node(
                            sub,
                            &child_segments,
                            name,
                            locale,
                        )));
                    } else {
                        tracing::warn!(
                            entry = %entry,
                            "meta entry does not match any page or folder"
                        );
                    }
                }
            }
        }
        nodes
    }

    /// Children not claimed elsewhere, sorted by file name.
    fn rest_children(
        &self,
        dir: &Directory,
        segments: &[&str],
        locale: Option<&str>,
        used: &BTreeSet<&str>,
        reversed: bool,
    ) -> Vec<Node> {
        let mut entries: Vec<(&str, Node)> = Vec::new();

        for stem in dir.pages.keys() {
            if stem == "index" || used.contains(stem.as_str()) {
                continue;
            }
            if let Some(page) = dir.localized_page(stem, locale) {
                entries.push((stem, Node::Page(self.page_node(page, segments, stem, locale))));
            }
        }

        for (name, sub) in &dir.dirs {
            if used.contains(name.as_str()) {
                continue;
            }
            let mut child_segments = segments.to_vec();
            child_segments.push(name);
            entries.push((
                name,
                Node::Folder(self.folder_node(sub, &child_segments, name, locale)),
            ));
        }

        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        if reversed {
            entries.reverse();
        }
        entries.into_iter().map(|(_, node)| node).collect()
    }

    fn page_node(
        &self,
        page: &PageFile,
        segments: &[&str],
        stem: &str,
        locale: Option<&str>,
    ) -> PageNode {
        PageNode {
            name: page.title.clone(),
            url: make_url(segments, stem, locale),
            icon: self.resolve_icon(page.icon.as_deref()),
            external: false,
        }
    }

    fn resolve_icon(&self, icon: Option<&str>) -> Option<String> {
        let icon = icon?;
        match &self.resolver {
            Some(resolver) => resolver.resolve(icon),
            None => Some(icon.to_owned()),
        }
    }
}

/// One parsed entry of a meta `pages` list.
enum MetaEntry<'a> {
    Rest,
    RestReversed,
    Exclude(&'a str),
    Link { name: &'a str, url: &'a str },
    Separator(&'a str),
    Item(&'a str),
}

fn parse_meta_entry(entry: &str) -> MetaEntry<'_> {
    if entry == "..." {
        return MetaEntry::Rest;
    }
    if entry == "z...a" {
        return MetaEntry::RestReversed;
    }
    if let Some(name) = entry.strip_prefix('!') {
        return MetaEntry::Exclude(name);
    }
    if entry.len() >= 6 && entry.starts_with("---") && entry.ends_with("---") {
        return MetaEntry::Separator(&entry[3..entry.len() - 3]);
    }
    if let Some(rest) = entry.strip_prefix('[') {
        if let Some((name, url)) = rest.split_once("](") {
            if let Some(url) = url.strip_suffix(')') {
                return MetaEntry::Link { name, url };
            }
        }
    }
    MetaEntry::Item(entry)
}

/// Content of one directory of the file map.
#[derive(Default)]
struct Directory {
    /// Page stem → locale (empty string = default) → file.
    pages: BTreeMap<String, BTreeMap<String, PageFile>>,
    /// Locale (empty string = default) → meta contents.
    metas: BTreeMap<String, MetaData>,
    dirs: BTreeMap<String, Directory>,
}

impl Directory {
    fn descend(&mut self, dirs: &[&str]) -> &mut Directory {
        let mut current = self;
        for segment in dirs {
            current = current.dirs.entry((*segment).to_owned()).or_default();
        }
        current
    }

    /// Page for a stem, preferring the locale variant.
    fn localized_page(&self, stem: &str, locale: Option<&str>) -> Option<&PageFile> {
        let variants = self.pages.get(stem)?;
        if let Some(locale) = locale {
            if let Some(page) = variants.get(locale) {
                return Some(page);
            }
        }
        variants.get("")
    }

    /// Meta contents, preferring the locale variant.
    fn meta(&self, locale: Option<&str>) -> Option<&MetaData> {
        if let Some(locale) = locale {
            if let Some(meta) = self.metas.get(locale) {
                return Some(meta);
            }
        }
        self.metas.get("")
    }
}

fn group_files(files: &[SourceFile], languages: &[String]) -> Directory {
    let mut root = Directory::default();
    for file in files {
        match file {
            SourceFile::Page(page) => {
                let (dirs, filename) = split_dir_file(&page.path);
                let (stem, locale) = split_locale(strip_extension(filename), languages);
                root.descend(&dirs)
                    .pages
                    .entry(stem.to_owned())
                    .or_default()
                    .insert(locale.unwrap_or("").to_owned(), page.clone());
            }
            SourceFile::Meta(meta) => {
                let (dirs, filename) = split_dir_file(&meta.path);
                let (stem, locale) = split_locale(strip_extension(filename), languages);
                if stem != "meta" {
                    tracing::warn!(path = %meta.path, "ignoring unrecognized meta file");
                    continue;
                }
                root.descend(&dirs)
                    .metas
                    .insert(locale.unwrap_or("").to_owned(), meta.data.clone());
            }
        }
    }
    root
}

fn split_dir_file(path: &str) -> (Vec<&str>, &str) {
    match path.rsplit_once('/') {
        Some((dir, filename)) => (
            dir.split('/').filter(|segment| !segment.is_empty()).collect(),
            filename,
        ),
        None => (Vec::new(), path),
    }
}

fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => filename,
    }
}

/// Split a locale suffix off a stem (`setup.fr` → `setup` + `fr`), but
/// only for configured languages so dotted page names survive.
fn split_locale<'a>(stem: &'a str, languages: &[String]) -> (&'a str, Option<&'a str>) {
    if let Some((base, suffix)) = stem.rsplit_once('.') {
        if languages.iter().any(|language| language == suffix) {
            return (base, Some(suffix));
        }
    }
    (stem, None)
}

fn make_url(segments: &[&str], stem: &str, locale: Option<&str>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(locale) = locale {
        parts.push(locale);
    }
    parts.extend_from_slice(segments);
    if stem != "index" {
        parts.push(stem);
    }
    format!("/{}", parts.join("/"))
}

/// Turn a path segment into a display name (`getting-started` →
/// `Getting Started`).
fn path_to_name(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_map::MetaFile;

    fn page(path: &str, title: &str) -> SourceFile {
        SourceFile::Page(PageFile::new(path, title))
    }

    fn meta(path: &str, json: &str) -> SourceFile {
        SourceFile::Meta(MetaFile {
            path: path.to_owned(),
            data: serde_json::from_str(json).unwrap(),
        })
    }

    fn page_names(nodes: &[Node]) -> Vec<&str> {
        nodes
            .iter()
            .map(|node| match node {
                Node::Page(page) => page.name.as_str(),
                Node::Folder(folder) => folder.name.as_str(),
                Node::Separator(separator) => separator.name.as_str(),
            })
            .collect()
    }

    #[test]
    fn test_default_ordering_is_alphabetical() {
        let files = vec![
            page("zebra.mdx", "Zebra"),
            page("alpha.mdx", "Alpha"),
            page("guide/setup.mdx", "Setup"),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(page_names(&tree.children), vec!["Alpha", "Guide", "Zebra"]);
    }

    #[test]
    fn test_index_page_becomes_folder_index() {
        let files = vec![
            page("guide/index.mdx", "Guide Home"),
            page("guide/setup.mdx", "Setup"),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        let Node::Folder(folder) = &tree.children[0] else {
            panic!("expected folder");
        };
        assert_eq!(folder.name, "Guide Home");
        let index = folder.index.as_ref().unwrap();
        assert_eq!(index.url, "/guide");
        assert_eq!(page_names(&folder.children), vec!["Setup"]);
    }

    #[test]
    fn test_meta_pages_takes_over_ordering() {
        let files = vec![
            page("a.mdx", "A"),
            page("b.mdx", "B"),
            page("c.mdx", "C"),
            meta("meta.json", r#"{"pages": ["c", "a", "b"]}"#),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(page_names(&tree.children), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_rest_operator_appends_remaining_children() {
        let files = vec![
            page("a.mdx", "A"),
            page("b.mdx", "B"),
            page("c.mdx", "C"),
            meta("meta.json", r#"{"pages": ["b", "..."]}"#),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(page_names(&tree.children), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_reversed_rest_operator() {
        let files = vec![
            page("a.mdx", "A"),
            page("b.mdx", "B"),
            page("c.mdx", "C"),
            meta("meta.json", r#"{"pages": ["z...a"]}"#),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(page_names(&tree.children), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_exclusion_removes_from_rest() {
        let files = vec![
            page("a.mdx", "A"),
            page("b.mdx", "B"),
            page("secret.mdx", "Secret"),
            meta("meta.json", r#"{"pages": ["!secret", "..."]}"#),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(page_names(&tree.children), vec!["A", "B"]);
    }

    #[test]
    fn test_separator_and_link_entries() {
        let files = vec![
            page("a.mdx", "A"),
            meta(
                "meta.json",
                r#"{"pages": ["---Extras---", "a", "[Repo](https://example.com)"]}"#,
            ),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(page_names(&tree.children), vec!["Extras", "A", "Repo"]);
        let Node::Separator(separator) = &tree.children[0] else {
            panic!("expected separator");
        };
        assert_eq!(separator.name, "Extras");
        let Node::Page(link) = &tree.children[2] else {
            panic!("expected link page");
        };
        assert!(link.external);
        assert_eq!(link.url, "https://example.com");
    }

    #[test]
    fn test_unknown_meta_entry_is_skipped() {
        let files = vec![
            page("a.mdx", "A"),
            meta("meta.json", r#"{"pages": ["ghost", "a"]}"#),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(page_names(&tree.children), vec!["A"]);
    }

    #[test]
    fn test_folder_name_falls_back_to_segment() {
        let files = vec![page("getting-started/setup.mdx", "Setup")];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(page_names(&tree.children), vec!["Getting Started"]);
    }

    #[test]
    fn test_meta_title_wins_over_index_title() {
        let files = vec![
            page("guide/index.mdx", "Index Title"),
            meta("guide/meta.json", r#"{"title": "Meta Title", "root": true}"#),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        let Node::Folder(folder) = &tree.children[0] else {
            panic!("expected folder");
        };
        assert_eq!(folder.name, "Meta Title");
        assert!(folder.root);
    }

    #[test]
    fn test_localized_variant_overrides_default() {
        let files = vec![
            page("guide/setup.mdx", "Setup"),
            page("guide/setup.fr.mdx", "Configuration"),
            page("guide/other.mdx", "Other"),
        ];
        let builder = PageTreeBuilder::new().with_languages(["fr"]);

        let trees = builder.build_all(&files);
        let french = &trees["fr"];

        let Node::Folder(folder) = &french.children[0] else {
            panic!("expected folder");
        };
        // Localized title where a variant exists, fallback otherwise;
        // URLs carry the language prefix.
        assert_eq!(page_names(&folder.children), vec!["Other", "Configuration"]);
        let Node::Page(setup) = &folder.children[1] else {
            panic!("expected page");
        };
        assert_eq!(setup.url, "/fr/guide/setup");
    }

    #[test]
    fn test_default_tree_ignores_locale_variants() {
        let files = vec![
            page("setup.mdx", "Setup"),
            page("setup.fr.mdx", "Configuration"),
        ];
        let builder = PageTreeBuilder::new().with_languages(["fr"]);

        let tree = builder.build(&files);

        assert_eq!(page_names(&tree.children), vec!["Setup"]);
    }

    #[test]
    fn test_icon_resolver_is_authoritative() {
        struct KnownIcons;
        impl IconResolver for KnownIcons {
            fn resolve(&self, icon: &str) -> Option<String> {
                (icon == "book").then(|| "icon-book".to_owned())
            }
        }

        let files = vec![
            page("a.mdx", "A"),
            SourceFile::Page(PageFile::new("b.mdx", "B").with_icon("book")),
            SourceFile::Page(PageFile::new("c.mdx", "C").with_icon("ghost")),
        ];
        let builder = PageTreeBuilder::new().with_icon_resolver(Box::new(KnownIcons));

        let tree = builder.build(&files);

        let icons: Vec<Option<&str>> = tree
            .children
            .iter()
            .map(|node| match node {
                Node::Page(page) => page.icon.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(icons, vec![None, Some("icon-book"), None]);
    }

    #[test]
    fn test_root_tree_name_from_meta() {
        let files = vec![
            page("index.mdx", "Home"),
            meta("meta.json", r#"{"title": "Docs"}"#),
        ];

        let tree = PageTreeBuilder::new().build(&files);

        assert_eq!(tree.name, "Docs");
    }

    #[test]
    fn test_root_index_url_is_slash() {
        let files = vec![page("index.mdx", "Home")];

        let tree = PageTreeBuilder::new().build(&files);

        // The root index is the tree's landing page, not a child entry.
        assert!(tree.children.is_empty());
        assert_eq!(tree.name, "Home");
    }

    #[test]
    fn test_dotted_page_names_survive_locale_split() {
        let files = vec![page("v1.2.mdx", "Version 1.2")];
        let builder = PageTreeBuilder::new().with_languages(["fr"]);

        let tree = builder.build(&files);

        assert_eq!(page_names(&tree.children), vec!["Version 1.2"]);
        let Node::Page(node) = &tree.children[0] else {
            panic!("expected page");
        };
        assert_eq!(node.url, "/v1.2");
    }
}
