#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! BLAKE3 integrity hashing for toolchest
//!
//! Package integrity hashes cover the declared metadata blob of an
//! archive. The persisted hash-file format is the base64 text form.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use blake3::Hasher;
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use toolchest_errors::{Error, StorageError};

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// A BLAKE3 hash value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash {
    bytes: [u8; 32],
}

impl Hash {
    /// Create a hash from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Compute hash of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        Self::from_bytes(*blake3::hash(data).as_bytes())
    }

    /// Base64 text form, as written to `.tpkg.hash` files
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }

    /// Parse the base64 text form
    ///
    /// # Errors
    /// Returns an error if the input is not valid base64 or does not
    /// decode to exactly 32 bytes.
    pub fn from_base64(s: &str) -> Result<Self, Error> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| StorageError::CorruptedData {
                message: format!("invalid base64 hash: {e}"),
            })?;

        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| StorageError::CorruptedData {
                message: format!("hash must be 32 bytes, got {}", bytes.len()),
            })?;
        Ok(Self::from_bytes(array))
    }

    /// Compute hash of a file's contents
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|_| StorageError::PathNotFound {
                path: path.display().to_string(),
            })?;

        let mut hasher = Hasher::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Self::from_bytes(*hasher.finalize().as_bytes()))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}
