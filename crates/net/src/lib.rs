#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package fetching for toolchest
//!
//! Defines the `PackageFetcher` interface the acquisition pipeline
//! consumes, and an HTTP implementation that resolves versions against
//! flat source indexes and streams artifacts with retry and backoff.

mod client;
mod fetcher;

pub use client::{NetClient, NetConfig, RetryConfig};
pub use fetcher::{HttpPackageFetcher, PackageFetcher};
