//! Topic tree builder
//!
//! Reconciles the clustering output tables into a labeled topic forest.
//!
//! [`TopicTreeBuilder::build`] runs the stages in order:
//!
//! 1. Membership: group documents by assigned cluster, dropping outliers
//! 2. Leaves: one node per cluster seen in the summaries or the membership
//! 3. Merge graph: parent -> children adjacency, cut at the distance threshold
//! 4. Aggregate: walk from the roots, summing sizes and merging terms
//! 5. Diagnostics: structural counters over the emitted nodes
//!
//! A build is a pure, single-pass transformation. It never fails; malformed
//! rows are skipped and counted in [`BuildStats`].

use crate::aggregate::TopicArena;
use crate::diagnostics::HierarchyDiagnostics;
use crate::leaves::{build_leaves, ClusterTerms, SummaryRow};
use crate::membership::aggregate_membership;
use crate::merge::{MergeGraph, MergeRow};
use crate::types::{TopicNode, TopicTreeConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Conditional tracing support
// ---------------------------------------------------------------------------

/// Enter a tracing span for a build stage (when the `tracing` feature is
/// enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("topic_tree_stage", stage = $name).entered();
    };
}

// ============================================================================
// Inputs and outputs
// ============================================================================

/// The three tables produced by the clustering pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterTables {
    /// Document ids, positionally aligned with `assignments`
    pub doc_ids: Vec<i64>,
    /// One cluster-id-like scalar per document; `-1` marks an outlier
    pub assignments: Vec<Value>,
    /// Optional per-document probability vectors
    pub probabilities: Option<Vec<Vec<f64>>>,
    /// Per-cluster summary rows
    pub summaries: Vec<SummaryRow>,
    /// Per-cluster representative terms
    pub terms: Vec<ClusterTerms>,
    /// Pairwise merge table
    pub merges: Vec<MergeRow>,
}

impl ClusterTables {
    /// Create tables from documents and their assignments
    pub fn new(doc_ids: Vec<i64>, assignments: Vec<Value>) -> Self {
        Self {
            doc_ids,
            assignments,
            ..Self::default()
        }
    }

    /// Create tables from integer assignments
    pub fn from_assignments(doc_ids: Vec<i64>, assignments: &[i64]) -> Self {
        Self::new(doc_ids, assignments.iter().map(|&a| Value::from(a)).collect())
    }

    pub fn with_probabilities(mut self, probabilities: Vec<Vec<f64>>) -> Self {
        self.probabilities = Some(probabilities);
        self
    }

    pub fn with_summaries(mut self, summaries: Vec<SummaryRow>) -> Self {
        self.summaries = summaries;
        self
    }

    pub fn with_terms(mut self, terms: Vec<ClusterTerms>) -> Self {
        self.terms = terms;
        self
    }

    pub fn with_merges(mut self, merges: Vec<MergeRow>) -> Self {
        self.merges = merges;
        self
    }
}

/// Counts of input entries the build skipped or cut
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Assignments equal to the outlier sentinel
    pub outliers: usize,
    /// Assignments with an unresolvable cluster id
    pub unresolved_assignments: usize,
    /// Assignments with no document at the same position
    pub misaligned_assignments: usize,
    /// Summary rows with an unresolvable or outlier id
    pub skipped_summary_rows: usize,
    /// Merge rows with an unresolvable id
    pub dropped_merge_rows: usize,
    /// Merge rows above the distance threshold
    pub pruned_merge_rows: usize,
}

/// Output of a build: the ordered forest plus diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMap {
    /// Nodes ordered by ascending level, then ascending topic id
    pub nodes: Vec<TopicNode>,
    pub diagnostics: HierarchyDiagnostics,
    pub stats: BuildStats,
}

impl TopicMap {
    /// Look up a node by topic id
    pub fn node(&self, topic_id: i64) -> Option<&TopicNode> {
        self.nodes.iter().find(|n| n.topic_id == topic_id)
    }

    /// Direct children of a node, ascending by topic id
    pub fn children(&self, topic_id: i64) -> Vec<&TopicNode> {
        self.nodes
            .iter()
            .filter(|n| n.parent_id == Some(topic_id))
            .collect()
    }

    /// Nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = &TopicNode> {
        self.nodes.iter().filter(|n| n.is_root())
    }

    /// Nodes carrying directly assigned documents
    pub fn leaves(&self) -> impl Iterator<Item = &TopicNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`TopicMap`] from [`ClusterTables`]
#[derive(Debug, Clone, Default)]
pub struct TopicTreeBuilder {
    config: TopicTreeConfig,
}

impl TopicTreeBuilder {
    /// Create a builder with the default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: TopicTreeConfig) -> Self {
        Self { config }
    }

    /// Set the number of representative terms per topic
    pub fn with_top_n_terms(mut self, top_n: usize) -> Self {
        self.config.top_n_terms = top_n;
        self
    }

    /// Cut merges above this distance
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.config.hierarchy.max_distance = Some(max_distance);
        self
    }

    pub fn config(&self) -> &TopicTreeConfig {
        &self.config
    }

    /// Build the topic forest.
    pub fn build(&self, tables: &ClusterTables) -> TopicMap {
        let top_n = self.config.effective_top_n();
        let mut stats = BuildStats::default();

        let membership = {
            trace_stage!("membership");
            let membership = aggregate_membership(
                &tables.doc_ids,
                &tables.assignments,
                tables.probabilities.as_deref(),
            );
            stats.outliers = membership.outliers;
            stats.unresolved_assignments = membership.unresolved;
            stats.misaligned_assignments = membership.misaligned;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                topics = membership.members.len(),
                members = membership.total_members(),
                outliers = membership.outliers,
                unresolved = membership.unresolved,
                misaligned = membership.misaligned,
                "aggregated membership"
            );
            membership
        };

        let leaves = {
            trace_stage!("leaves");
            let leaves = build_leaves(&tables.summaries, &tables.terms, membership, top_n);
            stats.skipped_summary_rows = leaves.skipped_rows;
            leaves
        };

        let graph = {
            trace_stage!("merge_graph");
            let graph = MergeGraph::from_rows(&tables.merges, self.config.hierarchy.distance_cutoff());
            stats.dropped_merge_rows = graph.dropped_rows;
            stats.pruned_merge_rows = graph.pruned_rows;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                parents = graph.parent_count(),
                dropped = graph.dropped_rows,
                pruned = graph.pruned_rows,
                "built merge graph"
            );
            graph
        };

        let roots = graph.roots();
        let nodes = {
            trace_stage!("aggregate");
            let mut arena = TopicArena::from_nodes(leaves.nodes);
            arena.materialize_parents(&graph);
            arena.aggregate(&graph, &roots, top_n);
            arena.into_sorted_nodes()
        };

        let diagnostics = {
            trace_stage!("diagnostics");
            let diagnostics = HierarchyDiagnostics::compute(&nodes, &graph, &roots);
            #[cfg(feature = "tracing")]
            warn_if_collapsed(&diagnostics);
            diagnostics
        };

        TopicMap {
            nodes,
            diagnostics,
            stats,
        }
    }
}

#[cfg(feature = "tracing")]
fn warn_if_collapsed(diagnostics: &HierarchyDiagnostics) {
    if diagnostics.is_collapsed() {
        tracing::warn!(
            parents_expected = diagnostics.parents_expected,
            "merge table named parents but no parent links were emitted"
        );
    }
}

/// Build a topic forest with the given config.
pub fn build_topic_tree(tables: &ClusterTables, config: &TopicTreeConfig) -> TopicMap {
    TopicTreeBuilder::with_config(config.clone()).build(tables)
}
