//! JSON entry points exposed to Python
//!
//! The whole request crosses the boundary as one JSON string, so a
//! dataframe-backed caller pays a single serialization per build.

use crate::errors::TopicTreeError;
use crate::json::{build_batch_from_json, build_from_json};
use pyo3::prelude::*;

fn to_py_err(err: TopicTreeError) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

/// Build a topic tree from a JSON request
///
/// Args:
///     json_input: JSON string with documents, assignments, topic_info,
///         topic_terms, hierarchy and params
///
/// Returns:
///     JSON string with `topics` and `meta`
#[pyfunction]
#[pyo3(signature = (json_input))]
pub fn build_topic_tree_json(py: Python<'_>, json_input: &str) -> PyResult<String> {
    py.allow_threads(|| build_from_json(json_input)).map_err(to_py_err)
}

/// Build topic trees for an array of requests
///
/// Requests run in parallel. A failing request yields `{"error": ...}` in
/// its slot.
#[pyfunction]
#[pyo3(signature = (json_input))]
pub fn build_topic_tree_batch_json(py: Python<'_>, json_input: &str) -> PyResult<String> {
    py.allow_threads(|| build_batch_from_json(json_input))
        .map_err(to_py_err)
}
