//! Runtime identifier compatibility graph
//!
//! Mirrors the `runtime.json` document shape: each runtime identifier
//! names the identifiers it falls back to, most specific first. The
//! graph is an explicitly constructed value with caller-controlled
//! lifetime; tests supply synthetic graphs.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use toolchest_errors::{Error, StorageError};

/// Default graph shipped with the crate
const BUILTIN_GRAPH: &str = include_str!("../data/runtimes.json");

#[derive(Debug, Deserialize)]
struct GraphDocument {
    runtimes: BTreeMap<String, GraphEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphEntry {
    #[serde(rename = "#import", default)]
    imports: Vec<String>,
}

/// Compatibility/fallback relation between runtime identifiers
#[derive(Debug, Clone)]
pub struct RuntimeGraph {
    imports: BTreeMap<String, Vec<String>>,
}

impl RuntimeGraph {
    /// Parse a graph from its JSON document form
    ///
    /// # Errors
    /// Returns an error if the document is not valid JSON of the
    /// expected shape.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let doc: GraphDocument = serde_json::from_str(text)?;
        Ok(Self {
            imports: doc
                .runtimes
                .into_iter()
                .map(|(rid, entry)| (rid, entry.imports))
                .collect(),
        })
    }

    /// Load a graph from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_file(path: &Path) -> Result<Self, Error> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;
        Self::from_json(&text)
    }

    /// The graph compiled into this crate
    ///
    /// # Panics
    /// Never panics; the embedded document is validated by tests.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_GRAPH).expect("embedded runtime graph is valid")
    }

    /// All identifiers compatible with `rid`, nearest first
    ///
    /// The expansion starts with `rid` itself and walks imports
    /// breadth-first, deduplicating. Identifiers absent from the graph
    /// expand to themselves only.
    #[must_use]
    pub fn expand(&self, rid: &str) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = std::collections::VecDeque::from([rid.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(imports) = self.imports.get(&current) {
                queue.extend(imports.iter().cloned());
            }
            order.push(current);
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_parses() {
        let graph = RuntimeGraph::builtin();
        assert!(graph.expand("linux-x64").contains(&"any".to_string()));
    }

    #[test]
    fn test_expand_nearest_first() {
        let graph = RuntimeGraph::from_json(
            r##"{"runtimes": {
                "linux-x64": {"#import": ["linux", "unix"]},
                "linux": {"#import": ["unix"]},
                "unix": {"#import": ["any"]},
                "any": {"#import": []}
            }}"##,
        )
        .unwrap();

        assert_eq!(graph.expand("linux-x64"), ["linux-x64", "linux", "unix", "any"]);
    }

    #[test]
    fn test_expand_unknown_rid() {
        let graph = RuntimeGraph::from_json(r##"{"runtimes": {}}"##).unwrap();
        assert_eq!(graph.expand("freebsd-x64"), ["freebsd-x64"]);
    }

    #[test]
    fn test_expand_handles_cycles() {
        let graph = RuntimeGraph::from_json(
            r##"{"runtimes": {
                "a": {"#import": ["b"]},
                "b": {"#import": ["a"]}
            }}"##,
        )
        .unwrap();
        assert_eq!(graph.expand("a"), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtimes.json");
        tokio::fs::write(&path, r##"{"runtimes": {"win-x64": {"#import": ["win"]}}}"##)
            .await
            .unwrap();

        let graph = RuntimeGraph::from_file(&path).await.unwrap();
        assert_eq!(graph.expand("win-x64"), ["win-x64", "win"]);
    }
}
