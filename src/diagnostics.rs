//! Structural sanity counters for a finished build.
//!
//! A flat result can be genuine (the merge table was empty or cut away) or
//! the symptom of a failed reconciliation (parents named but never linked).
//! [`HierarchyDiagnostics`] carries enough to tell the two apart.

use crate::merge::MergeGraph;
use crate::types::TopicNode;
use serde::{Deserialize, Serialize};

/// Structural counters of an emitted topic forest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyDiagnostics {
    /// Distinct parent ids in the (distance-filtered) merge table
    pub parents_expected: usize,
    /// How many of those parents were emitted as nodes
    pub parents_emitted: usize,
    /// Number of roots the walk started from
    pub roots: usize,
    /// Nodes carrying directly assigned documents
    pub leaf_count: usize,
    /// Deepest level in the output
    pub max_level: usize,
    /// Whether any node has a parent
    pub has_links: bool,
}

impl HierarchyDiagnostics {
    /// Compute counters over the emitted nodes.
    pub fn compute(nodes: &[TopicNode], graph: &MergeGraph, roots: &[i64]) -> Self {
        Self {
            parents_expected: graph.parent_count(),
            parents_emitted: nodes.iter().filter(|n| graph.is_parent(n.topic_id)).count(),
            roots: roots.len(),
            leaf_count: nodes.iter().filter(|n| n.is_leaf()).count(),
            max_level: nodes.iter().map(|n| n.level).max().unwrap_or(0),
            has_links: nodes.iter().any(|n| n.parent_id.is_some()),
        }
    }

    /// The merge table named parents but the output has no parent links.
    pub fn is_collapsed(&self) -> bool {
        self.parents_expected > 0 && !self.has_links
    }

    /// Some merge-table parents are missing from the output.
    pub fn is_incomplete(&self) -> bool {
        self.parents_emitted < self.parents_expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeRow;
    use crate::types::TopicDoc;

    #[test]
    fn test_flat_result() {
        let mut a = TopicNode::stub(0);
        a.docs.push(TopicDoc::new(1, None));
        let b = TopicNode::stub(1);
        let graph = MergeGraph::default();
        let diag = HierarchyDiagnostics::compute(&[a, b], &graph, &[]);
        assert_eq!(diag.roots, 0);
        assert_eq!(diag.leaf_count, 1);
        assert_eq!(diag.max_level, 0);
        assert!(!diag.has_links);
        assert!(!diag.is_collapsed());
    }

    #[test]
    fn test_collapsed_and_incomplete() {
        let graph = MergeGraph::from_rows(&[MergeRow::new(2, 0, 1)], None);
        let diag = HierarchyDiagnostics::compute(&[TopicNode::stub(0)], &graph, &[2]);
        assert_eq!(diag.parents_expected, 1);
        assert_eq!(diag.parents_emitted, 0);
        assert!(diag.is_collapsed());
        assert!(diag.is_incomplete());
    }

    #[test]
    fn test_linked_result() {
        let graph = MergeGraph::from_rows(&[MergeRow::new(2, 0, 1)], None);
        let mut child = TopicNode::stub(0);
        child.parent_id = Some(2);
        child.level = 1;
        let diag = HierarchyDiagnostics::compute(&[TopicNode::stub(2), child], &graph, &[2]);
        assert_eq!(diag.parents_emitted, 1);
        assert_eq!(diag.max_level, 1);
        assert!(diag.has_links);
        assert!(!diag.is_collapsed());
    }
}
