//! Package fetcher interface and HTTP implementation
//!
//! A source is a base URL serving a flat layout:
//! `<base>/<id>/index.json` lists the available versions,
//! `<base>/<id>/<version>/<id>-<version>.tpkg` is the artifact.

use crate::NetClient;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use toolchest_errors::{Error, FetchError};
use toolchest_types::{PackageId, PackageLocation, Version, VersionSpec};
use tracing::{debug, warn};

/// External byte-transfer interface consumed by package acquisition
///
/// Implementations resolve a version constraint against the configured
/// sources, place the artifact under `dest_dir`, and expand artifacts
/// into directories. Errors propagate unchanged to the caller.
#[async_trait]
pub trait PackageFetcher: Send + Sync {
    /// Download the best version satisfying `spec` into `dest_dir`,
    /// returning the artifact path.
    async fn download(
        &self,
        id: &PackageId,
        spec: &VersionSpec,
        location: &PackageLocation,
        dest_dir: &Path,
    ) -> Result<PathBuf, Error>;

    /// Expand an artifact's file contents into `dest`, returning the
    /// relative paths of the extracted files.
    async fn extract(&self, artifact: &Path, dest: &Path) -> Result<Vec<PathBuf>, Error>;
}

/// Version index document served by a source (`index.json`)
#[derive(Debug, Deserialize)]
struct VersionIndex {
    versions: Vec<String>,
}

/// HTTP-backed package fetcher
pub struct HttpPackageFetcher {
    client: NetClient,
}

impl HttpPackageFetcher {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self { client }
    }

    /// Create with default client configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_defaults() -> Result<Self, Error> {
        Ok(Self::new(NetClient::with_defaults()?))
    }

    /// Resolve the best (version, source) pair across all sources
    async fn resolve(
        &self,
        id: &PackageId,
        spec: &VersionSpec,
        sources: &[String],
    ) -> Result<(Version, String), Error> {
        let mut best: Option<(Version, String)> = None;

        for source in sources {
            let base = source.trim_end_matches('/');
            let index_url = format!("{base}/{id}/index.json");

            let response = match self.client.get(&index_url).await {
                Ok(response) => response,
                Err(e) => {
                    // A package may legitimately live on only one of the
                    // configured sources.
                    warn!(source = base, package = %id, error = %e, "source skipped");
                    continue;
                }
            };

            let index: VersionIndex =
                response
                    .json()
                    .await
                    .map_err(|e| FetchError::InvalidIndex {
                        url: index_url.clone(),
                        message: e.to_string(),
                    })?;

            let candidates = index
                .versions
                .iter()
                .filter_map(|v| Version::parse(v).ok());
            if let Some(version) = spec.best_match(candidates) {
                match &best {
                    Some((current, _)) if *current >= version => {}
                    _ => best = Some((version, base.to_string())),
                }
            }
        }

        best.ok_or_else(|| {
            FetchError::NotFound {
                package: id.to_string(),
                constraint: spec.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl PackageFetcher for HttpPackageFetcher {
    async fn download(
        &self,
        id: &PackageId,
        spec: &VersionSpec,
        location: &PackageLocation,
        dest_dir: &Path,
    ) -> Result<PathBuf, Error> {
        if location.sources.is_empty() {
            return Err(FetchError::NoSources.into());
        }

        let (version, source) = self.resolve(id, spec, &location.sources).await?;
        let filename = format!("{id}-{version}.{}", toolchest_store::ARTIFACT_EXTENSION);
        let artifact_url = format!("{source}/{id}/{version}/{filename}");
        let artifact_path = dest_dir.join(&filename);

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, dest_dir))?;

        let size = self.client.download_file(&artifact_url, &artifact_path).await?;
        debug!(package = %id, %version, size, "artifact downloaded");

        Ok(artifact_path)
    }

    async fn extract(&self, artifact: &Path, dest: &Path) -> Result<Vec<PathBuf>, Error> {
        toolchest_store::extract_package(artifact, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn id(s: &str) -> PackageId {
        s.parse().unwrap()
    }

    fn location(sources: Vec<String>) -> PackageLocation {
        PackageLocation::new(sources, PathBuf::from("/unused"))
    }

    #[tokio::test]
    async fn test_download_resolves_highest_version() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/demo.tool/index.json");
            then.status(200)
                .json_body(serde_json::json!({"versions": ["1.0.0", "1.2.0", "0.9.0"]}));
        });
        let artifact = server.mock(|when, then| {
            when.method(GET).path("/demo.tool/1.2.0/demo.tool-1.2.0.tpkg");
            then.status(200).body("artifact bytes");
        });

        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpPackageFetcher::with_defaults().unwrap();

        let path = fetcher
            .download(
                &id("demo.tool"),
                &VersionSpec::any(),
                &location(vec![server.url("")]),
                dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "demo.tool-1.2.0.tpkg");
        assert_eq!(std::fs::read(&path).unwrap(), b"artifact bytes");
        artifact.assert();
    }

    #[tokio::test]
    async fn test_download_respects_constraint() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/demo.tool/index.json");
            then.status(200)
                .json_body(serde_json::json!({"versions": ["1.0.0", "2.0.0"]}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/demo.tool/1.0.0/demo.tool-1.0.0.tpkg");
            then.status(200).body("old");
        });

        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpPackageFetcher::with_defaults().unwrap();

        let path = fetcher
            .download(
                &id("demo.tool"),
                &"<2.0.0".parse::<VersionSpec>().unwrap(),
                &location(vec![server.url("")]),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "demo.tool-1.0.0.tpkg");
    }

    #[tokio::test]
    async fn test_best_version_across_sources() {
        let first = MockServer::start();
        first.mock(|when, then| {
            when.method(GET).path("/demo.tool/index.json");
            then.status(200)
                .json_body(serde_json::json!({"versions": ["1.0.0"]}));
        });

        let second = MockServer::start();
        second.mock(|when, then| {
            when.method(GET).path("/demo.tool/index.json");
            then.status(200)
                .json_body(serde_json::json!({"versions": ["1.5.0"]}));
        });
        second.mock(|when, then| {
            when.method(GET).path("/demo.tool/1.5.0/demo.tool-1.5.0.tpkg");
            then.status(200).body("newer");
        });

        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpPackageFetcher::with_defaults().unwrap();

        let path = fetcher
            .download(
                &id("demo.tool"),
                &VersionSpec::any(),
                &location(vec![first.url(""), second.url("")]),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "demo.tool-1.5.0.tpkg");
    }

    #[tokio::test]
    async fn test_unknown_package_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/demo.tool/index.json");
            then.status(404);
        });

        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpPackageFetcher::with_defaults().unwrap();

        let result = fetcher
            .download(
                &id("demo.tool"),
                &VersionSpec::any(),
                &location(vec![server.url("")]),
                dir.path(),
            )
            .await;
        assert!(matches!(
            result,
            Err(Error::Fetch(FetchError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_no_sources_configured() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpPackageFetcher::with_defaults().unwrap();

        let result = fetcher
            .download(
                &id("demo.tool"),
                &VersionSpec::any(),
                &location(vec![]),
                dir.path(),
            )
            .await;
        assert!(matches!(result, Err(Error::Fetch(FetchError::NoSources))));
    }
}
