//! Rule-based best-match asset selection
//!
//! Criteria are evaluated in list order; the first one producing a
//! non-empty group wins and evaluation stops. Within one criterion,
//! exactly one shelf (framework, runtime) is chosen: framework
//! candidates are tried exact-then-`any`, runtime candidates follow the
//! compatibility graph expansion nearest-first, then `any`.

use crate::content::{ContentItem, ContentItemCollection, PatternSet};
use crate::runtimes::RuntimeGraph;

/// One match rule: a target framework plus an optional runtime identifier
///
/// A criterion without a runtime only accepts runtime-neutral (`any`)
/// shelves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriterion {
    pub framework: String,
    pub runtime: Option<String>,
}

impl SelectionCriterion {
    #[must_use]
    pub fn new(framework: impl Into<String>, runtime: Option<String>) -> Self {
        Self {
            framework: framework.into(),
            runtime,
        }
    }
}

/// An item emitted into a selected group: path plus the properties the
/// manifest preserves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetItem {
    pub path: String,
    pub locale: Option<String>,
    pub related: Option<String>,
}

impl From<&ContentItem> for AssetItem {
    fn from(item: &ContentItem) -> Self {
        Self {
            path: item.path.clone(),
            locale: item.locale.clone(),
            related: item.related.clone(),
        }
    }
}

/// The shelf selected for a target, together with the criterion that
/// selected it
#[derive(Debug, Clone)]
pub struct AssetGroup {
    pub criterion: SelectionCriterion,
    pub items: Vec<AssetItem>,
}

/// Find the best asset group for an ordered criteria list
///
/// Returns the group selected by the first criterion matching at least
/// one item, or `None` when no criterion matches; the caller decides
/// whether that is fatal. `post` runs on every emitted item before it is
/// added to the group.
#[must_use]
pub fn select_best_group(
    criteria: &[SelectionCriterion],
    collection: &ContentItemCollection,
    pattern: &PatternSet,
    graph: &RuntimeGraph,
    post: Option<&dyn Fn(AssetItem) -> AssetItem>,
) -> Option<AssetGroup> {
    for criterion in criteria {
        if let Some(items) = match_criterion(criterion, collection.items(pattern), graph) {
            let items = items
                .into_iter()
                .map(|item| match post {
                    Some(hook) => hook(item),
                    None => item,
                })
                .collect();
            return Some(AssetGroup {
                criterion: criterion.clone(),
                items,
            });
        }
    }
    None
}

/// Try one criterion; returns the single best shelf, eagerly materialized
fn match_criterion(
    criterion: &SelectionCriterion,
    items: &[ContentItem],
    graph: &RuntimeGraph,
) -> Option<Vec<AssetItem>> {
    let mut frameworks = vec![criterion.framework.as_str()];
    if criterion.framework != "any" {
        frameworks.push("any");
    }

    let mut runtimes = match &criterion.runtime {
        Some(rid) => graph.expand(rid),
        None => Vec::new(),
    };
    if runtimes.iter().all(|r| r != "any") {
        runtimes.push("any".to_string());
    }

    for framework in &frameworks {
        for runtime in &runtimes {
            let shelf: Vec<AssetItem> = items
                .iter()
                .filter(|i| i.framework == *framework && i.runtime == *runtime)
                .map(AssetItem::from)
                .collect();
            if !shelf.is_empty() {
                return Some(shelf);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TOOLS_ASSEMBLIES;
    use std::path::PathBuf;

    fn collection(paths: &[&str]) -> ContentItemCollection {
        let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
        ContentItemCollection::index(&paths)
    }

    fn graph() -> RuntimeGraph {
        RuntimeGraph::builtin()
    }

    fn criterion(framework: &str, runtime: Option<&str>) -> SelectionCriterion {
        SelectionCriterion::new(framework, runtime.map(String::from))
    }

    #[test]
    fn test_exact_framework_wins_over_fallback() {
        let collection = collection(&[
            "tools/net8.0/any/demo.dll",
            "tools/net6.0/any/demo.dll",
        ]);
        let criteria = [
            criterion("net8.0", Some("linux-x64")),
            criterion("net6.0", Some("linux-x64")),
        ];

        let group =
            select_best_group(&criteria, &collection, &TOOLS_ASSEMBLIES, &graph(), None).unwrap();
        assert_eq!(group.criterion, criteria[0]);
        assert_eq!(group.items.len(), 1);
        assert_eq!(group.items[0].path, "tools/net8.0/any/demo.dll");
    }

    #[test]
    fn test_first_criterion_short_circuits() {
        // Both criteria could match; the second must never be evaluated
        // into the result.
        let collection = collection(&["tools/any/any/demo.dll"]);
        let criteria = [criterion("net8.0", None), criterion("net6.0", None)];

        let group =
            select_best_group(&criteria, &collection, &TOOLS_ASSEMBLIES, &graph(), None).unwrap();
        assert_eq!(group.criterion.framework, "net8.0");
    }

    #[test]
    fn test_runtime_expansion_prefers_nearest_shelf() {
        let collection = collection(&[
            "tools/net8.0/linux/demo.dll",
            "tools/net8.0/any/demo.dll",
        ]);
        let criteria = [criterion("net8.0", Some("linux-x64"))];

        let group =
            select_best_group(&criteria, &collection, &TOOLS_ASSEMBLIES, &graph(), None).unwrap();
        assert_eq!(group.items[0].path, "tools/net8.0/linux/demo.dll");
    }

    #[test]
    fn test_exact_runtime_beats_compatible() {
        let collection = collection(&[
            "tools/net8.0/linux-x64/demo.dll",
            "tools/net8.0/linux/demo.dll",
        ]);
        let criteria = [criterion("net8.0", Some("linux-x64"))];

        let group =
            select_best_group(&criteria, &collection, &TOOLS_ASSEMBLIES, &graph(), None).unwrap();
        assert_eq!(group.items[0].path, "tools/net8.0/linux-x64/demo.dll");
    }

    #[test]
    fn test_shelves_are_never_merged() {
        let collection = collection(&[
            "tools/net8.0/linux-x64/a.dll",
            "tools/net8.0/linux-x64/b.dll",
            "tools/net8.0/any/c.dll",
        ]);
        let criteria = [criterion("net8.0", Some("linux-x64"))];

        let group =
            select_best_group(&criteria, &collection, &TOOLS_ASSEMBLIES, &graph(), None).unwrap();
        let paths: Vec<_> = group.items.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            ["tools/net8.0/linux-x64/a.dll", "tools/net8.0/linux-x64/b.dll"]
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        let collection = collection(&["tools/net8.0/win-x64/demo.exe"]);
        let criteria = [criterion("net8.0", Some("linux-x64"))];

        assert!(
            select_best_group(&criteria, &collection, &TOOLS_ASSEMBLIES, &graph(), None).is_none()
        );
    }

    #[test]
    fn test_criterion_without_runtime_only_accepts_any() {
        let collection = collection(&["tools/net8.0/linux-x64/demo.dll"]);
        let criteria = [criterion("net8.0", None)];
        assert!(
            select_best_group(&criteria, &collection, &TOOLS_ASSEMBLIES, &graph(), None).is_none()
        );
    }

    #[test]
    fn test_post_hook_applies_to_every_item() {
        let collection = collection(&[
            "tools/net8.0/any/a.dll",
            "tools/net8.0/any/b.dll",
        ]);
        let criteria = [criterion("net8.0", Some("linux-x64"))];
        let upper = |mut item: AssetItem| {
            item.path = item.path.to_ascii_uppercase();
            item
        };

        let group = select_best_group(
            &criteria,
            &collection,
            &TOOLS_ASSEMBLIES,
            &graph(),
            Some(&upper),
        )
        .unwrap();
        assert!(group.items.iter().all(|i| i.path.starts_with("TOOLS/")));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let paths = [
            "tools/net8.0/any/b.dll",
            "tools/net8.0/any/a.dll",
            "tools/net6.0/any/a.dll",
        ];
        let criteria = [criterion("net8.0", Some("osx-arm64"))];

        let first = select_best_group(
            &criteria,
            &collection(&paths),
            &TOOLS_ASSEMBLIES,
            &graph(),
            None,
        )
        .unwrap();
        let second = select_best_group(
            &criteria,
            &collection(&paths),
            &TOOLS_ASSEMBLIES,
            &graph(),
            None,
        )
        .unwrap();
        assert_eq!(first.items, second.items);
    }
}
