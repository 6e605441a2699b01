//! JSON interface
//!
//! Accepts the clustering pipeline's tables the way a dataframe-backed
//! producer serializes them: ids as ints, floats or formatted strings,
//! BERTopic column names, optional probability vectors, and a loosely typed
//! `params` object. Returns the ordered topic list plus a `meta` block.
//!
//! This is the only layer that can fail: a request without documents or
//! assignments, or with a non-integer document id, is rejected before the
//! build starts.

use crate::builder::{BuildStats, ClusterTables, TopicMap, TopicTreeBuilder};
use crate::diagnostics::HierarchyDiagnostics;
use crate::errors::{Result, TopicTreeError};
use crate::ids::{coerce_float, normalize_float_id};
use crate::leaves::{ClusterTerms, RawTerms, SummaryRow};
use crate::merge::MergeRow;
use crate::types::{Linkage, TopicNode, TopicTreeConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Request
// ============================================================================

/// A document reference: `{"id": 3, ...}` or a bare id
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonDocument {
    Object { id: Value },
    Id(Value),
}

impl JsonDocument {
    fn id(&self) -> &Value {
        match self {
            JsonDocument::Object { id } => id,
            JsonDocument::Id(id) => id,
        }
    }
}

/// Term table: a list of `{cluster_id, terms}` or an object keyed by cluster id
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonTermTable {
    List(Vec<ClusterTerms>),
    Map(BTreeMap<String, RawTerms>),
}

impl Default for JsonTermTable {
    fn default() -> Self {
        JsonTermTable::List(Vec::new())
    }
}

impl From<JsonTermTable> for Vec<ClusterTerms> {
    fn from(table: JsonTermTable) -> Self {
        match table {
            JsonTermTable::List(items) => items,
            JsonTermTable::Map(map) => map
                .into_iter()
                .map(|(key, terms)| ClusterTerms {
                    cluster_id: Value::String(key),
                    terms,
                })
                .collect(),
        }
    }
}

/// Hierarchy parameters as sent by the caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonHierarchyParams {
    #[serde(default)]
    pub max_distance: Value,
    #[serde(default)]
    pub use_ctfidf: Value,
    #[serde(default)]
    pub linkage: Value,
}

/// Build parameters as sent by the caller. Unknown keys (clustering
/// parameters meant for the upstream pipeline) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonParams {
    #[serde(default)]
    pub top_n_terms: Value,
    #[serde(default)]
    pub hierarchy: Option<JsonHierarchyParams>,
}

impl From<JsonParams> for TopicTreeConfig {
    fn from(params: JsonParams) -> Self {
        // non-positive and unparseable counts fall back to the default
        let top_n_terms = lenient_int(&params.top_n_terms)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        let hierarchy = params.hierarchy.unwrap_or_default();

        let linkage = match &hierarchy.linkage {
            Value::String(name) => name.parse::<Linkage>().unwrap_or_else(|_err| {
                #[cfg(feature = "tracing")]
                tracing::warn!(linkage = %name, "{}; using ward", _err);
                Linkage::Ward
            }),
            _ => Linkage::Ward,
        };

        let mut config = TopicTreeConfig::default()
            .with_top_n_terms(top_n_terms)
            .with_linkage(linkage)
            .with_use_ctfidf(hierarchy.use_ctfidf.as_bool().unwrap_or(true));
        if let Some(max_distance) = coerce_float(&hierarchy.max_distance).filter(|d| d.is_finite()) {
            config = config.with_max_distance(max_distance);
        }
        config
    }
}

/// A full build request
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRequest {
    #[serde(default, alias = "doc_ids")]
    pub documents: Vec<JsonDocument>,
    #[serde(default, alias = "topics")]
    pub assignments: Vec<Value>,
    /// One probability vector (or a single probability) per document
    #[serde(default)]
    pub probabilities: Option<Vec<Value>>,
    #[serde(default, alias = "summaries")]
    pub topic_info: Vec<SummaryRow>,
    #[serde(default)]
    pub topic_terms: JsonTermTable,
    #[serde(default, alias = "merges")]
    pub hierarchy: Option<Vec<MergeRow>>,
    #[serde(default)]
    pub params: JsonParams,
}

impl JsonRequest {
    /// Validate the request and split it into tables and config.
    pub fn into_parts(self) -> Result<(ClusterTables, TopicTreeConfig)> {
        if self.documents.is_empty() {
            return Err(TopicTreeError::empty_input("no documents provided"));
        }
        if self.assignments.is_empty() {
            return Err(TopicTreeError::empty_input("no cluster assignments provided"));
        }

        let doc_ids = self
            .documents
            .iter()
            .enumerate()
            .map(|(idx, doc)| {
                lenient_int(doc.id())
                    .ok_or_else(|| TopicTreeError::invalid_document_id(idx, doc.id().to_string()))
            })
            .collect::<Result<Vec<i64>>>()?;

        let probabilities = self
            .probabilities
            .map(|rows| rows.iter().map(probability_row).collect());

        let tables = ClusterTables {
            doc_ids,
            assignments: self.assignments,
            probabilities,
            summaries: self.topic_info,
            terms: self.topic_terms.into(),
            merges: self.hierarchy.unwrap_or_default(),
        };
        Ok((tables, self.params.into()))
    }
}

/// Read an integer the way a strict `int()` cast would: integers, floats
/// (truncated) and integer strings. Formatted text like `"Topic 3"` is rejected.
fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(|f| normalize_float_id(f).get())),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn probability_row(row: &Value) -> Vec<f64> {
    match row {
        Value::Array(items) => items.iter().filter_map(coerce_float).collect(),
        other => coerce_float(other).into_iter().collect(),
    }
}

// ============================================================================
// Response
// ============================================================================

/// Summary block of a response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonMeta {
    /// Number of emitted topics
    pub nr_topics: usize,
    /// Documents assigned to the outlier topic
    pub outliers: usize,
    #[serde(flatten)]
    pub diagnostics: HierarchyDiagnostics,
    pub linkage: Linkage,
    pub use_ctfidf: bool,
    pub stats: BuildStats,
}

/// Output result for JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonResult {
    pub topics: Vec<TopicNode>,
    pub meta: JsonMeta,
}

impl JsonResult {
    fn from_map(map: TopicMap, config: &TopicTreeConfig) -> Self {
        Self {
            meta: JsonMeta {
                nr_topics: map.nodes.len(),
                outliers: map.stats.outliers,
                diagnostics: map.diagnostics,
                linkage: config.hierarchy.linkage,
                use_ctfidf: config.hierarchy.use_ctfidf,
                stats: map.stats,
            },
            topics: map.nodes,
        }
    }
}

/// One slot of a batch response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonBatchItem {
    Ok(JsonResult),
    Err { error: String },
}

// ============================================================================
// Entry points
// ============================================================================

/// Build a topic tree from a parsed request
pub fn build_from_request(request: JsonRequest) -> Result<JsonResult> {
    let (tables, config) = request.into_parts()?;
    let map = TopicTreeBuilder::with_config(config.clone()).build(&tables);
    Ok(JsonResult::from_map(map, &config))
}

/// Build a topic tree from a JSON request string, returning a JSON string
pub fn build_from_json(json_input: &str) -> Result<String> {
    let request: JsonRequest = serde_json::from_str(json_input)?;
    let result = build_from_request(request)?;
    Ok(serde_json::to_string(&result)?)
}

/// Build many independent requests in parallel.
///
/// The input is a JSON array of requests. A request that fails validation
/// yields `{"error": "..."}` in its slot; the others are unaffected.
pub fn build_batch_from_json(json_input: &str) -> Result<String> {
    let requests: Vec<JsonRequest> = serde_json::from_str(json_input)?;
    let results: Vec<JsonBatchItem> = requests
        .into_par_iter()
        .map(|request| match build_from_request(request) {
            Ok(result) => JsonBatchItem::Ok(result),
            Err(err) => JsonBatchItem::Err {
                error: err.to_string(),
            },
        })
        .collect();
    Ok(serde_json::to_string(&results)?)
}
