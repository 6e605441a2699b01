//! Python bindings via PyO3

pub mod json;

use pyo3::prelude::*;

/// Register all Python functions
pub fn register_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    m.add_function(wrap_pyfunction!(json::build_topic_tree_json, m)?)?;
    m.add_function(wrap_pyfunction!(json::build_topic_tree_batch_json, m)?)?;

    Ok(())
}
