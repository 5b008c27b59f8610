#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Tool package installation for toolchest
//!
//! Composes the fetcher, store, and manifest builder into the
//! acquisition pipeline: resolve and download a package, verify and
//! extract it, select the assets for the current target, and persist
//! the manifest. Global installs stage into a temporary directory and
//! are relocated into the permanent store; local installs stay where
//! they were extracted.

mod acquire;
mod installer;

pub use acquire::acquire;
pub use installer::{InstallScope, MoveRetryConfig, ToolInstaller};
