//! Content item indexing
//!
//! Turns the flat file list of an extracted package into structured
//! items, parsing the framework, runtime, optional locale and
//! related-file linkage out of the path segments. Pure; no I/O.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A named path-pattern group
///
/// `root` is the first path segment items of this group live under; the
/// two segments after it are the framework and runtime shelf address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternSet {
    pub name: &'static str,
    pub root: &'static str,
}

/// Executable assets of a tool package: `tools/{framework}/{runtime}/...`
pub const TOOLS_ASSEMBLIES: PatternSet = PatternSet {
    name: "tools-assemblies",
    root: "tools",
};

/// Pattern sets recognized by the indexer
const PATTERN_SETS: &[PatternSet] = &[TOOLS_ASSEMBLIES];

/// Extensions considered primary items for related-file linkage
const PRIMARY_EXTENSIONS: &[&str] = &["dll", "exe"];

/// One indexed file path with its parsed properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Full path within the package, `/`-separated
    pub path: String,
    /// Framework segment, e.g. `net8.0` or `any`
    pub framework: String,
    /// Runtime identifier segment, e.g. `linux-x64` or `any`
    pub runtime: String,
    /// Culture of a satellite item, when the path carries one
    pub locale: Option<String>,
    /// Extensions of sibling files sharing this item's stem, e.g. `.pdb;.xml`
    pub related: Option<String>,
}

/// Indexed view of a package's file list
#[derive(Debug, Default)]
pub struct ContentItemCollection {
    groups: HashMap<&'static str, Vec<ContentItem>>,
}

impl ContentItemCollection {
    /// Index a file list
    #[must_use]
    pub fn index(paths: &[PathBuf]) -> Self {
        let mut groups: HashMap<&'static str, Vec<ContentItem>> = HashMap::new();

        for pattern in PATTERN_SETS {
            let mut items: Vec<ContentItem> = paths
                .iter()
                .filter_map(|p| parse_item(p, pattern))
                .collect();
            // Index order must not depend on filesystem iteration order
            items.sort_by(|a, b| a.path.cmp(&b.path));
            link_related(&mut items);
            groups.insert(pattern.name, items);
        }

        Self { groups }
    }

    /// Items matching a pattern set, in deterministic path order
    #[must_use]
    pub fn items(&self, pattern: &PatternSet) -> &[ContentItem] {
        self.groups.get(pattern.name).map_or(&[], Vec::as_slice)
    }
}

fn parse_item(path: &Path, pattern: &PatternSet) -> Option<ContentItem> {
    let normalized = path
        .to_str()?
        .replace('\\', "/");
    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

    // root / framework / runtime / file...
    if segments.len() < 4 || segments[0] != pattern.root {
        return None;
    }

    let framework = segments[1].to_string();
    let runtime = segments[2].to_string();
    let rest = &segments[3..];

    let locale = if rest.len() >= 2 && is_culture_segment(rest[0]) {
        Some(rest[0].to_string())
    } else {
        None
    };

    Some(ContentItem {
        path: segments.join("/"),
        framework,
        runtime,
        locale,
        related: None,
    })
}

/// Culture-shaped segment: `fr`, `pt-BR`, `zh-Hans`, ...
fn is_culture_segment(s: &str) -> bool {
    let mut parts = s.split('-');
    let Some(language) = parts.next() else {
        return false;
    };
    if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_lowercase()) {
        return false;
    }
    parts.all(|p| {
        (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric())
    })
}

/// Fill in the `related` property for primary items: the sorted extension
/// list of sibling files sharing the same directory and stem.
fn link_related(items: &mut [ContentItem]) {
    let mut siblings: HashMap<String, Vec<String>> = HashMap::new();

    for item in items.iter() {
        if let Some((stem, ext)) = split_stem(&item.path) {
            siblings.entry(stem).or_default().push(ext);
        }
    }

    for item in items.iter_mut() {
        let Some((stem, ext)) = split_stem(&item.path) else {
            continue;
        };
        if !PRIMARY_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }

        let mut others: Vec<String> = siblings[&stem]
            .iter()
            .filter(|e| **e != ext)
            .map(|e| format!(".{e}"))
            .collect();
        if !others.is_empty() {
            others.sort();
            item.related = Some(others.join(";"));
        }
    }
}

fn split_stem(path: &str) -> Option<(String, String)> {
    let (stem, ext) = path.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') || stem.ends_with('/') {
        return None;
    }
    Some((stem.to_string(), ext.to_string()))
}
