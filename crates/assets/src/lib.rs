#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Asset selection for tool packages
//!
//! Package assets are organized as alternative "shelves" addressed by
//! framework and runtime identifier, e.g.
//! `tools/net8.0/linux-x64/demo.dll`. This crate indexes the flat file
//! list of an extracted package into structured content items and picks
//! exactly one shelf for a given target, consulting a runtime
//! compatibility graph for fallback runtimes. Shelves are never merged.

mod content;
mod criteria;
mod runtimes;

pub use content::{ContentItem, ContentItemCollection, PatternSet, TOOLS_ASSEMBLIES};
pub use criteria::{select_best_group, AssetGroup, AssetItem, SelectionCriterion};
pub use runtimes::RuntimeGraph;
