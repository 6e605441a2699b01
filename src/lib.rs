//! # topic_tree
//!
//! Reconciles the output of a document clustering pipeline into a labeled
//! topic hierarchy.
//!
//! The pipeline hands over three loosely typed tables: per-document cluster
//! assignments (with optional probabilities), per-cluster summary rows with
//! representative terms, and a pairwise merge table. [`TopicTreeBuilder`]
//! turns them into an ordered forest of [`TopicNode`]s where every parent
//! knows its size, its size-weighted terms and a readable label, plus
//! [`HierarchyDiagnostics`] that flag a hierarchy that silently collapsed.
//!
//! ## Features
//!
//! - **Lenient ids**: `3`, `3.0`, `"3"` and `"Topic 3"` all resolve to topic 3
//! - **Total**: malformed rows are skipped and counted, never fatal
//! - **Deep trees**: the aggregation walk is iterative and cycle-safe
//! - **Python bindings**: JSON entry points via PyO3 (`python` feature)

pub mod aggregate;
pub mod builder;
pub mod diagnostics;
pub mod errors;
pub mod ids;
pub mod json;
pub mod leaves;
pub mod membership;
pub mod merge;
pub mod types;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use errors::{Result, TopicTreeError};
pub use types::{HierarchyConfig, Linkage, TopicDoc, TopicNode, TopicTerm, TopicTreeConfig};

// Re-export main functionality
pub use builder::{build_topic_tree, BuildStats, ClusterTables, TopicMap, TopicTreeBuilder};
pub use diagnostics::HierarchyDiagnostics;
pub use ids::{normalize_id, NormalizedId, OUTLIER_TOPIC};
pub use json::{build_batch_from_json, build_from_json};
pub use leaves::{ClusterTerms, SummaryRow};
pub use merge::{MergeGraph, MergeRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Initialize the Python module
#[cfg(feature = "python")]
#[pymodule]
fn _rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register_module(m)?;
    Ok(())
}
