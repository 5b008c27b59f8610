//! Asset manifest construction
//!
//! Resolves an extracted package from the store, indexes its content
//! list, runs best-match selection for the current target, and persists
//! the result.

use crate::AssetManifest;
use std::path::{Path, PathBuf};
use toolchest_assets::{
    select_best_group, AssetItem, ContentItemCollection, RuntimeGraph, SelectionCriterion,
    TOOLS_ASSEMBLIES,
};
use toolchest_errors::{Error, StorageError};
use toolchest_store::ToolPackageStore;
use toolchest_types::{PackageId, PackageKind, TargetEnvironment, Version};
use tracing::debug;

/// Build and persist the asset manifest for an extracted package
///
/// `store` must already contain the package; acquisition has to have
/// succeeded before this is called, so absence is a store invariant
/// violation, not a recoverable condition. Returns the path of the
/// written manifest file.
///
/// For non-tool package kinds no selection is attempted and the manifest
/// lists zero assets. A tool package whose content matches no criterion
/// also yields an empty asset list; the manifest is still written.
///
/// # Errors
///
/// Returns `StorageError::ConsistencyViolation` if the package is not in
/// the store, or an error if listing files or writing the manifest fails.
pub async fn build_tool_manifest(
    store: &ToolPackageStore,
    graph: &RuntimeGraph,
    id: &PackageId,
    version: &Version,
    target: &TargetEnvironment,
    dest_dir: &Path,
) -> Result<PathBuf, Error> {
    let package = store.find_package(id, version).await?.ok_or_else(|| {
        StorageError::ConsistencyViolation {
            package: id.to_string(),
            version: version.to_string(),
            path: store.package_dir(id, version).display().to_string(),
        }
    })?;

    let files = package.list_files().await?;
    let collection = ContentItemCollection::index(&files);

    // Single-entry criteria list for the current target; extension point
    // for multi-fallback lists.
    let criteria = [SelectionCriterion::new(
        target.framework.clone(),
        Some(target.runtime.clone()),
    )];

    let kind = package.metadata().kind;
    let mut manifest = AssetManifest::new(id.clone(), version.clone(), kind, target.clone());

    if kind == PackageKind::Tool {
        let group = select_best_group(
            &criteria,
            &collection,
            &TOOLS_ASSEMBLIES,
            graph,
            Some(&normalize_separators),
        );
        match group {
            Some(group) => {
                debug!(
                    package = %id,
                    framework = %group.criterion.framework,
                    items = group.items.len(),
                    "selected tools-assemblies group"
                );
                manifest.set_tools_assemblies(&group);
            }
            None => {
                debug!(package = %id, "no tools-assemblies matched the target");
            }
        }
    }

    manifest.save(dest_dir).await
}

fn normalize_separators(mut item: AssetItem) -> AssetItem {
    if item.path.contains('\\') {
        item.path = item.path.replace('\\', "/");
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MANIFEST_FILENAME;
    use tokio::fs;
    use toolchest_types::PackageMetadata;

    async fn seed_store(
        root: &Path,
        id: &PackageId,
        version: &Version,
        kind: PackageKind,
        files: &[&str],
    ) -> ToolPackageStore {
        let store = ToolPackageStore::new(root.to_path_buf());
        let dir = store.package_dir(id, version);

        let meta = PackageMetadata {
            name: id.clone(),
            version: version.clone(),
            kind,
            description: None,
        };
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join("package.toml"), meta.to_toml().unwrap())
            .await
            .unwrap();
        for file in files {
            let path = dir.join(file);
            fs::create_dir_all(path.parent().unwrap()).await.unwrap();
            fs::write(&path, b"x").await.unwrap();
        }
        store
    }

    fn demo_id() -> PackageId {
        "demo.tool".parse().unwrap()
    }

    fn v120() -> Version {
        Version::parse("1.2.0").unwrap()
    }

    #[tokio::test]
    async fn test_builds_manifest_for_target_framework() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seed_store(
            tmp.path(),
            &demo_id(),
            &v120(),
            PackageKind::Tool,
            &["tools/net8.0/any/demo.dll", "tools/net6.0/any/demo.dll"],
        )
        .await;

        let target = TargetEnvironment::new("net8.0", "linux-x64");
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).await.unwrap();

        let path = build_tool_manifest(
            &store,
            &RuntimeGraph::builtin(),
            &demo_id(),
            &v120(),
            &target,
            &out,
        )
        .await
        .unwrap();

        assert_eq!(path, out.join(MANIFEST_FILENAME));
        let manifest = AssetManifest::from_file(&path).await.unwrap();
        assert_eq!(manifest.package.id, demo_id());
        assert_eq!(manifest.package.version, v120());
        let paths: Vec<_> = manifest
            .assets
            .tools_assemblies
            .iter()
            .map(|a| a.path.as_str())
            .collect();
        assert_eq!(paths, ["tools/net8.0/any/demo.dll"]);
    }

    #[tokio::test]
    async fn test_zero_matches_still_writes_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seed_store(
            tmp.path(),
            &demo_id(),
            &v120(),
            PackageKind::Tool,
            &["docs/readme.md"],
        )
        .await;

        let target = TargetEnvironment::new("net8.0", "linux-x64");
        let path = build_tool_manifest(
            &store,
            &RuntimeGraph::builtin(),
            &demo_id(),
            &v120(),
            &target,
            tmp.path(),
        )
        .await
        .unwrap();

        let manifest = AssetManifest::from_file(&path).await.unwrap();
        assert!(manifest.assets.tools_assemblies.is_empty());
    }

    #[tokio::test]
    async fn test_library_kind_selects_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seed_store(
            tmp.path(),
            &demo_id(),
            &v120(),
            PackageKind::Library,
            &["tools/net8.0/any/demo.dll"],
        )
        .await;

        let target = TargetEnvironment::new("net8.0", "linux-x64");
        let path = build_tool_manifest(
            &store,
            &RuntimeGraph::builtin(),
            &demo_id(),
            &v120(),
            &target,
            tmp.path(),
        )
        .await
        .unwrap();

        let manifest = AssetManifest::from_file(&path).await.unwrap();
        assert_eq!(manifest.package.kind, PackageKind::Library);
        assert!(manifest.assets.tools_assemblies.is_empty());
    }

    #[tokio::test]
    async fn test_missing_package_is_consistency_violation() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ToolPackageStore::new(tmp.path().to_path_buf());
        let target = TargetEnvironment::new("net8.0", "linux-x64");

        let result = build_tool_manifest(
            &store,
            &RuntimeGraph::builtin(),
            &demo_id(),
            &v120(),
            &target,
            tmp.path(),
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Storage(StorageError::ConsistencyViolation { .. }))
        ));
    }
}
