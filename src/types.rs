//! Core types for topic_tree
//!
//! This module defines the node records emitted by a build, the
//! representative term and member document entries they carry, and the
//! build configuration.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Default number of representative terms kept per topic.
pub const DEFAULT_TOP_N_TERMS: usize = 10;

/// Number of aggregated terms joined into a derived label.
pub const LABEL_TERM_COUNT: usize = 4;

/// Placeholder label for a topic with no explicit or derived name.
pub fn placeholder_label(topic_id: i64) -> String {
    format!("Topic {}", topic_id)
}

// ============================================================================
// Terms and documents
// ============================================================================

/// A representative term of a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTerm {
    /// Term text, trimmed
    pub term: String,
    /// Term weight (c-TF-IDF score for leaves, size-weighted sum for internal nodes)
    pub score: f64,
    /// 1-based rank within the topic
    pub rank: usize,
}

impl TopicTerm {
    /// Create a new term
    pub fn new(term: impl Into<String>, score: f64, rank: usize) -> Self {
        Self {
            term: term.into(),
            score,
            rank,
        }
    }

    /// Deterministic comparator: descending score, ties broken by current rank.
    pub fn stable_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.rank.cmp(&other.rank))
    }
}

/// Sort terms by descending score (stable on ties), truncate to `top_n`
/// and re-rank 1..N.
pub fn rank_terms(mut terms: Vec<TopicTerm>, top_n: usize) -> Vec<TopicTerm> {
    terms.sort_by(|a, b| a.stable_cmp(b));
    terms.truncate(top_n);
    for (idx, term) in terms.iter_mut().enumerate() {
        term.rank = idx + 1;
    }
    terms
}

/// A document directly assigned to a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDoc {
    /// Document id
    pub id: i64,
    /// Highest assignment probability of the document, when known
    pub weight: Option<f64>,
}

impl TopicDoc {
    pub fn new(id: i64, weight: Option<f64>) -> Self {
        Self { id, weight }
    }
}

// ============================================================================
// TopicNode
// ============================================================================

/// One node of the topic forest: a cluster or a synthesized merge node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNode {
    /// Unique id within a build
    pub topic_id: i64,
    /// Parent in the merge hierarchy; `None` for roots
    pub parent_id: Option<i64>,
    /// Depth from the node's root (root = 0)
    pub level: usize,
    /// Display label, never empty
    pub label: String,
    /// Leaf: document count. Internal: sum of children's sizes.
    pub size: usize,
    /// Average assignment confidence of the cluster, when reported
    pub score: Option<f64>,
    /// Representative terms, descending score, ranks 1..N
    pub terms: Vec<TopicTerm>,
    /// Directly assigned documents, ascending id; empty for internal nodes
    pub docs: Vec<TopicDoc>,
}

impl TopicNode {
    /// Create a stub node with zero size and a placeholder label.
    ///
    /// Stubs stand in for ids the merge table references but no summary row
    /// or assignment ever produced.
    pub fn stub(topic_id: i64) -> Self {
        Self {
            topic_id,
            parent_id: None,
            level: 0,
            label: placeholder_label(topic_id),
            size: 0,
            score: None,
            terms: Vec::new(),
            docs: Vec::new(),
        }
    }

    /// Check if this node carries directly assigned documents
    pub fn is_leaf(&self) -> bool {
        !self.docs.is_empty()
    }

    /// Check if this node is a root of the forest
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if the label is still the generic placeholder.
    ///
    /// Any label starting with `"Topic "` counts, so a real name such as
    /// `"Topic modeling"` on a merge parent is replaced by a derived label.
    pub fn has_placeholder_label(&self) -> bool {
        self.label.trim().is_empty() || self.label.starts_with("Topic ")
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Linkage method requested from the upstream dendrogram computation.
///
/// The builder does not compute linkage itself; the value is validated and
/// echoed back so callers can tell which dendrogram they are looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    #[default]
    Ward,
    Single,
    Complete,
    Average,
    Weighted,
    Centroid,
    Median,
}

impl Linkage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Linkage::Ward => "ward",
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Weighted => "weighted",
            Linkage::Centroid => "centroid",
            Linkage::Median => "median",
        }
    }
}

impl FromStr for Linkage {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "" | "ward" => Ok(Linkage::Ward),
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            "weighted" => Ok(Linkage::Weighted),
            "centroid" => Ok(Linkage::Centroid),
            "median" => Ok(Linkage::Median),
            other => Err(format!("unknown linkage '{}'", other)),
        }
    }
}

/// Hierarchy options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Merges with a distance above this are cut from the hierarchy
    #[serde(default)]
    pub max_distance: Option<f64>,
    /// Whether the upstream dendrogram was computed from c-TF-IDF vectors
    #[serde(default = "default_use_ctfidf")]
    pub use_ctfidf: bool,
    #[serde(default)]
    pub linkage: Linkage,
}

fn default_use_ctfidf() -> bool {
    true
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_distance: None,
            use_ctfidf: true,
            linkage: Linkage::Ward,
        }
    }
}

impl HierarchyConfig {
    /// The distance cutoff, ignoring non-finite values
    pub fn distance_cutoff(&self) -> Option<f64> {
        self.max_distance.filter(|d| d.is_finite())
    }
}

/// Configuration for a topic tree build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTreeConfig {
    /// Maximum representative terms per topic; 0 means the default
    #[serde(default = "default_top_n_terms")]
    pub top_n_terms: usize,
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
}

fn default_top_n_terms() -> usize {
    DEFAULT_TOP_N_TERMS
}

impl Default for TopicTreeConfig {
    fn default() -> Self {
        Self {
            top_n_terms: DEFAULT_TOP_N_TERMS,
            hierarchy: HierarchyConfig::default(),
        }
    }
}

impl TopicTreeConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of terms actually kept per topic
    pub fn effective_top_n(&self) -> usize {
        if self.top_n_terms == 0 {
            DEFAULT_TOP_N_TERMS
        } else {
            self.top_n_terms
        }
    }

    /// Builder method: set top N terms
    pub fn with_top_n_terms(mut self, top_n: usize) -> Self {
        self.top_n_terms = top_n;
        self
    }

    /// Builder method: set the merge distance cutoff
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.hierarchy.max_distance = Some(max_distance);
        self
    }

    /// Builder method: set the linkage echoed in the output
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.hierarchy.linkage = linkage;
        self
    }

    /// Builder method: set whether c-TF-IDF vectors were used upstream
    pub fn with_use_ctfidf(mut self, use_ctfidf: bool) -> Self {
        self.hierarchy.use_ctfidf = use_ctfidf;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_terms_sorts_and_reranks() {
        let terms = vec![
            TopicTerm::new("low", 0.1, 1),
            TopicTerm::new("high", 0.9, 2),
            TopicTerm::new("mid", 0.5, 3),
        ];
        let ranked = rank_terms(terms, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].term, "high");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].term, "mid");
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_rank_terms_tie_keeps_rank_order() {
        let terms = vec![
            TopicTerm::new("first", 0.0, 1),
            TopicTerm::new("second", 0.0, 2),
            TopicTerm::new("third", 0.0, 3),
        ];
        let ranked = rank_terms(terms, 10);
        let names: Vec<_> = ranked.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_stub_node() {
        let node = TopicNode::stub(7);
        assert_eq!(node.label, "Topic 7");
        assert_eq!(node.size, 0);
        assert!(!node.is_leaf());
        assert!(node.is_root());
        assert!(node.has_placeholder_label());
    }

    #[test]
    fn test_placeholder_label_prefix() {
        let mut node = TopicNode::stub(3);
        assert!(node.has_placeholder_label());
        node.label = "Topic modeling".to_string();
        assert!(node.has_placeholder_label());
        node.label = "topic modeling".to_string();
        assert!(!node.has_placeholder_label());
        node.label = "  ".to_string();
        assert!(node.has_placeholder_label());
    }

    #[test]
    fn test_effective_top_n() {
        assert_eq!(TopicTreeConfig::default().effective_top_n(), 10);
        assert_eq!(TopicTreeConfig::default().with_top_n_terms(0).effective_top_n(), 10);
        assert_eq!(TopicTreeConfig::default().with_top_n_terms(3).effective_top_n(), 3);
    }

    #[test]
    fn test_distance_cutoff_ignores_nan() {
        let cfg = TopicTreeConfig::default().with_max_distance(f64::NAN);
        assert_eq!(cfg.hierarchy.distance_cutoff(), None);
        let cfg = TopicTreeConfig::default().with_max_distance(0.3);
        assert_eq!(cfg.hierarchy.distance_cutoff(), Some(0.3));
    }

    #[test]
    fn test_linkage_from_str() {
        assert_eq!("Average".parse::<Linkage>(), Ok(Linkage::Average));
        assert_eq!(" ".parse::<Linkage>(), Ok(Linkage::Ward));
        assert!("bogus".parse::<Linkage>().is_err());
    }

    #[test]
    fn test_config_serde_defaults() {
        let cfg: TopicTreeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, TopicTreeConfig::default());

        let cfg: TopicTreeConfig =
            serde_json::from_str(r#"{"top_n_terms": 5, "hierarchy": {"linkage": "single"}}"#)
                .unwrap();
        assert_eq!(cfg.top_n_terms, 5);
        assert_eq!(cfg.hierarchy.linkage, Linkage::Single);
        assert!(cfg.hierarchy.use_ctfidf);
    }
}
