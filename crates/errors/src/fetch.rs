//! Package fetcher error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("source unreachable: {url}: {message}")]
    SourceUnreachable { url: String, message: String },

    #[error("package not found upstream: {package} ({constraint})")]
    NotFound { package: String, constraint: String },

    #[error("HTTP error: status {status} from {url}")]
    HttpError { status: u16, url: String },

    #[error("download failed: {message}")]
    DownloadFailed { message: String },

    #[error("invalid source URL: {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid source index document from {url}: {message}")]
    InvalidIndex { url: String, message: String },

    #[error("no package sources configured")]
    NoSources,
}
