//! Installation error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum InstallError {
    #[error("installation failed: {message}")]
    Failed { message: String },

    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("manifest serialization failed: {message}")]
    ManifestError { message: String },
}
