//! Leaf node construction
//!
//! Every cluster seen in the summary rows or in the membership aggregation
//! becomes one leaf [`TopicNode`] with a resolved size, label, confidence
//! score and representative terms.

use crate::ids::{coerce_float, normalize_id, NormalizedId};
use crate::membership::Membership;
use crate::types::{placeholder_label, rank_terms, TopicNode, TopicTerm};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static LABEL_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\s]+").expect("label separator pattern is valid"));

/// Aspect used when a cluster's terms come as a multi-aspect representation.
pub const MAIN_ASPECT: &str = "Main";

// ============================================================================
// Input rows
// ============================================================================

/// Per-cluster summary row (one row of the topic info table)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(default, alias = "Topic")]
    pub cluster_id: Value,
    /// Reported document count
    #[serde(default, alias = "Count")]
    pub count: Value,
    /// Representative name
    #[serde(default, alias = "Name")]
    pub name: Value,
    /// Average assignment confidence
    #[serde(default, alias = "Probability")]
    pub average_probability: Value,
}

impl SummaryRow {
    /// Create a summary row from typed values
    pub fn new(cluster_id: i64, count: usize, name: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            count: count.into(),
            name: Value::String(name.into()),
            average_probability: Value::Null,
        }
    }

    /// Builder method: set the average probability
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.average_probability = probability.into();
        self
    }

    /// Trimmed non-empty name, if any
    pub fn label(&self) -> Option<String> {
        non_empty_text(&self.name)
    }
}

/// One upstream term entry: `[term, score]` or `{"term": .., "score": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTerm {
    Pair(Vec<Value>),
    Entry {
        term: Value,
        #[serde(default)]
        score: Value,
    },
    Other(Value),
}

impl RawTerm {
    /// Term text and coerced score; `None` when the entry carries no usable term.
    pub fn resolve(&self) -> Option<(String, f64)> {
        let (term, score) = match self {
            RawTerm::Pair(items) if items.len() >= 2 => (&items[0], &items[1]),
            RawTerm::Entry { term, score } => (term, score),
            _ => return None,
        };
        let text = scalar_text(term)?;
        let score = coerce_float(score).filter(|s| s.is_finite()).unwrap_or(0.0);
        Some((text, score))
    }
}

/// A cluster's term list as produced upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTerms {
    List(Vec<RawTerm>),
    /// Multi-aspect representation; the [`MAIN_ASPECT`] entry is used
    Aspects(FxHashMap<String, Vec<RawTerm>>),
    Other(Value),
}

impl Default for RawTerms {
    fn default() -> Self {
        RawTerms::List(Vec::new())
    }
}

impl RawTerms {
    /// The rank-ordered term entries to read from
    pub fn entries(&self) -> &[RawTerm] {
        match self {
            RawTerms::List(items) => items,
            RawTerms::Aspects(aspects) => aspects.get(MAIN_ASPECT).map_or(&[], Vec::as_slice),
            RawTerms::Other(_) => &[],
        }
    }
}

/// Representative terms of one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTerms {
    #[serde(default, alias = "Topic")]
    pub cluster_id: Value,
    #[serde(default)]
    pub terms: RawTerms,
}

impl ClusterTerms {
    /// Create a term list from typed `(term, score)` pairs
    pub fn new<S: Into<String>>(cluster_id: i64, terms: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            terms: RawTerms::List(
                terms
                    .into_iter()
                    .map(|(term, score)| RawTerm::Pair(vec![Value::String(term.into()), score.into()]))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// Leaf construction
// ============================================================================

/// Leaves built from the input tables, ascending by topic id.
#[derive(Debug, Clone, Default)]
pub struct LeafSet {
    pub nodes: Vec<TopicNode>,
    /// Summary rows skipped for an unresolvable or outlier id
    pub skipped_rows: usize,
}

/// Build one leaf per cluster id found in `summaries` or `membership`.
///
/// Size is `max(reported count, assigned documents)`. The label is the
/// summary name or `"Topic <id>"`. Terms are the first `top_n` usable
/// upstream entries, sorted by descending score; without any, the label is
/// split on whitespace and underscores into zero-score terms.
pub fn build_leaves(
    summaries: &[SummaryRow],
    terms: &[ClusterTerms],
    mut membership: Membership,
    top_n: usize,
) -> LeafSet {
    let mut skipped_rows = 0;
    let mut rows: FxHashMap<i64, &SummaryRow> = FxHashMap::default();
    for row in summaries {
        match normalize_id(&row.cluster_id).topic() {
            Some(id) => {
                rows.insert(id, row);
            }
            None => skipped_rows += 1,
        }
    }

    let mut term_lists: FxHashMap<i64, &RawTerms> = FxHashMap::default();
    for entry in terms {
        if let NormalizedId::Id(id) = normalize_id(&entry.cluster_id) {
            term_lists.entry(id).or_insert(&entry.terms);
        }
    }

    let mut topic_ids: FxHashSet<i64> = rows.keys().copied().collect();
    topic_ids.extend(membership.members.keys().copied());
    let mut topic_ids: Vec<i64> = topic_ids.into_iter().collect();
    topic_ids.sort_unstable();

    let nodes = topic_ids
        .into_iter()
        .map(|topic_id| {
            let docs = membership.take(topic_id);
            let row = rows.get(&topic_id).copied();
            let reported = row.and_then(|r| normalize_id(&r.count).get()).unwrap_or(0);
            let size = usize::try_from(reported).unwrap_or(0).max(docs.len());
            let label = row
                .and_then(SummaryRow::label)
                .unwrap_or_else(|| placeholder_label(topic_id));
            let score = row
                .and_then(|r| coerce_float(&r.average_probability))
                .filter(|p| p.is_finite());
            let terms = match term_lists.get(&topic_id) {
                Some(raw) => leaf_terms(raw.entries(), top_n),
                None => Vec::new(),
            };
            let terms = if terms.is_empty() {
                label_terms(&label, top_n)
            } else {
                terms
            };

            TopicNode {
                topic_id,
                parent_id: None,
                level: 0,
                label,
                size,
                score,
                terms,
                docs,
            }
        })
        .collect();

    LeafSet {
        nodes,
        skipped_rows,
    }
}

/// First `top_n` usable entries, sorted by descending score and re-ranked.
pub fn leaf_terms(entries: &[RawTerm], top_n: usize) -> Vec<TopicTerm> {
    let picked: Vec<TopicTerm> = entries
        .iter()
        .filter_map(RawTerm::resolve)
        .take(top_n)
        .enumerate()
        .map(|(idx, (term, score))| TopicTerm::new(term, score, idx + 1))
        .collect();
    rank_terms(picked, top_n)
}

/// Zero-score terms taken from the label's whitespace/underscore tokens.
pub fn label_terms(label: &str, top_n: usize) -> Vec<TopicTerm> {
    LABEL_SEPARATORS
        .split(label)
        .filter(|token| !token.is_empty())
        .take(top_n)
        .enumerate()
        .map(|(idx, token)| TopicTerm::new(token, 0.0, idx + 1))
        .collect()
}

fn non_empty_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
