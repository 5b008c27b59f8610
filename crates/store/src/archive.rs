//! Package archive handling (.tpkg files)
//!
//! A `.tpkg` archive is a deterministic tar containing the package
//! contents plus a `package.toml` metadata entry at the archive root.
//! The metadata entry can be read without unpacking the archive.

use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use tokio::fs;
use toolchest_errors::{Error, PackageError, StorageError};
use toolchest_types::METADATA_ENTRY;

/// Read the raw declared-metadata blob out of a `.tpkg` archive
///
/// # Errors
///
/// Returns an error if the archive cannot be opened, is not a valid tar,
/// or has no `package.toml` entry.
pub async fn read_metadata(tpkg_file: &Path) -> Result<Vec<u8>, Error> {
    let tpkg_file = tpkg_file.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&tpkg_file)
            .map_err(|e| StorageError::from_io_with_path(&e, &tpkg_file))?;
        let mut archive = Archive::new(file);

        for entry in archive.entries().map_err(corrupted)? {
            let mut entry = entry.map_err(corrupted)?;
            let path = entry.path().map_err(corrupted)?;

            if path.as_ref() == Path::new(METADATA_ENTRY) {
                let mut blob = Vec::new();
                entry.read_to_end(&mut blob).map_err(corrupted)?;
                return Ok(blob);
            }
        }

        Err(PackageError::MissingMetadata {
            entry: METADATA_ENTRY.to_string(),
            archive: tpkg_file.display().to_string(),
        }
        .into())
    })
    .await
    .map_err(|e| Error::internal(format!("metadata task failed: {e}")))?
}

/// Extract a `.tpkg` archive into a directory
///
/// Returns the relative paths of all extracted regular files, in archive
/// order.
///
/// # Errors
///
/// Returns an error if tar extraction fails, the archive attempts path
/// traversal, or I/O operations fail.
pub async fn extract_package(tpkg_file: &Path, dest: &Path) -> Result<Vec<PathBuf>, Error> {
    fs::create_dir_all(dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;

    let tpkg_file = tpkg_file.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&tpkg_file)
            .map_err(|e| StorageError::from_io_with_path(&e, &tpkg_file))?;
        let mut archive = Archive::new(file);
        archive.set_preserve_permissions(true);
        archive.set_unpack_xattrs(false);

        let mut extracted = Vec::new();

        for entry in archive.entries().map_err(corrupted)? {
            let mut entry = entry.map_err(corrupted)?;
            let path = entry.path().map_err(corrupted)?.into_owned();

            if path
                .components()
                .any(|c| c == std::path::Component::ParentDir)
            {
                return Err(PackageError::CorruptedArchive {
                    message: "archive contains path traversal".to_string(),
                }
                .into());
            }

            let is_file = entry.header().entry_type().is_file();
            entry.unpack_in(&dest).map_err(corrupted)?;

            if is_file {
                extracted.push(path);
            }
        }

        Ok::<Vec<PathBuf>, Error>(extracted)
    })
    .await
    .map_err(|e| Error::internal(format!("extract task failed: {e}")))?
}

/// Create a `.tpkg` archive from a directory
///
/// The source directory must contain a `package.toml` entry at its root.
///
/// # Errors
///
/// Returns an error if the metadata entry is missing, archive creation
/// fails, or I/O operations fail.
pub async fn create_package(src: &Path, tpkg_file: &Path) -> Result<(), Error> {
    let metadata_path = src.join(METADATA_ENTRY);
    if fs::metadata(&metadata_path).await.is_err() {
        return Err(PackageError::InvalidMetadata {
            message: format!("source directory missing {METADATA_ENTRY}"),
        }
        .into());
    }

    if let Some(parent) = tpkg_file.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(&e, parent))?;
    }

    let src = src.to_path_buf();
    let tpkg_file = tpkg_file.to_path_buf();

    tokio::task::spawn_blocking(move || {
        use std::io::{BufWriter, Write};

        let file = std::fs::File::create(&tpkg_file)
            .map_err(|e| StorageError::from_io_with_path(&e, &tpkg_file))?;
        let mut builder = tar::Builder::new(BufWriter::new(file));
        builder.mode(tar::HeaderMode::Deterministic);
        builder.follow_symlinks(false);

        add_dir_to_tar(&mut builder, &src, Path::new(""))?;
        let mut writer = builder.into_inner().map_err(|e| StorageError::IoError {
            message: e.to_string(),
        })?;
        writer.flush().map_err(|e| StorageError::IoError {
            message: e.to_string(),
        })?;

        Ok::<(), Error>(())
    })
    .await
    .map_err(|e| Error::internal(format!("create task failed: {e}")))??;

    Ok(())
}

fn corrupted(err: std::io::Error) -> Error {
    PackageError::CorruptedArchive {
        message: err.to_string(),
    }
    .into()
}

/// Recursively add directory contents to a tar builder
fn add_dir_to_tar<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    src: &Path,
    prefix: &Path,
) -> Result<(), Error> {
    let io_err = |e: std::io::Error| StorageError::IoError {
        message: e.to_string(),
    };

    let mut entries: Vec<_> = std::fs::read_dir(src)
        .map_err(io_err)?
        .collect::<std::io::Result<_>>()
        .map_err(io_err)?;
    // Deterministic archive order
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let tar_path = prefix.join(entry.file_name());
        let metadata = entry.metadata().map_err(io_err)?;

        if metadata.is_dir() {
            builder.append_dir(&tar_path, &path).map_err(io_err)?;
            add_dir_to_tar(builder, &path, &tar_path)?;
        } else if metadata.is_file() {
            let mut file = std::fs::File::open(&path).map_err(io_err)?;
            builder.append_file(&tar_path, &mut file).map_err(io_err)?;
        }
    }

    Ok(())
}
