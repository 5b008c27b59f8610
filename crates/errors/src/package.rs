//! Package-level error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PackageError {
    #[error("package {package} {version} conflicts with an existing install")]
    Conflict { package: String, version: String },

    #[error("invalid package metadata: {message}")]
    InvalidMetadata { message: String },

    #[error("invalid package id: {id}: {message}")]
    InvalidId { id: String, message: String },

    #[error("corrupted package archive: {message}")]
    CorruptedArchive { message: String },

    #[error("missing metadata entry {entry} in {archive}")]
    MissingMetadata { entry: String, archive: String },
}
