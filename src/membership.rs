//! Membership aggregation
//!
//! Groups documents by their assigned cluster. Assignments are positionally
//! aligned with the document id sequence and, optionally, with a sequence of
//! per-document probability vectors.

use crate::ids::{normalize_id, NormalizedId};
use crate::types::TopicDoc;
use rustc_hash::FxHashMap;
use serde_json::Value;

/// Documents grouped by cluster id, plus counters for what was left out.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    /// Cluster id -> documents, ascending by document id
    pub members: FxHashMap<i64, Vec<TopicDoc>>,
    /// Assignments equal to the outlier sentinel
    pub outliers: usize,
    /// Assignments whose cluster id could not be normalized
    pub unresolved: usize,
    /// Assignments with no document at the same position
    pub misaligned: usize,
}

impl Membership {
    /// Documents of a cluster (empty if none were assigned)
    pub fn docs(&self, topic_id: i64) -> &[TopicDoc] {
        self.members.get(&topic_id).map_or(&[], Vec::as_slice)
    }

    /// Number of documents directly assigned to a cluster
    pub fn count(&self, topic_id: i64) -> usize {
        self.docs(topic_id).len()
    }

    /// Cluster ids with at least one document, ascending
    pub fn topic_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.members.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Total number of documents placed in some cluster
    pub fn total_members(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    /// Take the document list of a cluster, leaving it empty
    pub fn take(&mut self, topic_id: i64) -> Vec<TopicDoc> {
        self.members.remove(&topic_id).unwrap_or_default()
    }
}

/// Highest probability of a document, if it can be determined.
///
/// Missing and empty vectors give `None`. Non-finite entries are ignored;
/// a vector with no finite entry gives `None`.
pub fn document_weight(probabilities: Option<&[f64]>) -> Option<f64> {
    probabilities?
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .reduce(f64::max)
}

/// Group documents by cluster id.
///
/// Outlier and unresolvable assignments are dropped. An assignment at an
/// index past the end of `doc_ids` is skipped. Within each cluster,
/// documents are sorted ascending by id; a document id repeated within one
/// cluster keeps its first occurrence.
pub fn aggregate_membership(
    doc_ids: &[i64],
    assignments: &[Value],
    probabilities: Option<&[Vec<f64>]>,
) -> Membership {
    let mut membership = Membership::default();

    for (idx, assigned) in assignments.iter().enumerate() {
        let topic_id = match normalize_id(assigned) {
            NormalizedId::Unrepresentable => {
                membership.unresolved += 1;
                continue;
            }
            id if id.is_outlier() => {
                membership.outliers += 1;
                continue;
            }
            NormalizedId::Id(id) => id,
        };
        let Some(&doc_id) = doc_ids.get(idx) else {
            membership.misaligned += 1;
            continue;
        };
        let row = probabilities.and_then(|rows| rows.get(idx)).map(Vec::as_slice);
        membership
            .members
            .entry(topic_id)
            .or_default()
            .push(TopicDoc::new(doc_id, document_weight(row)));
    }

    for docs in membership.members.values_mut() {
        docs.sort_by_key(|doc| doc.id);
        docs.dedup_by_key(|doc| doc.id);
    }

    membership
}
