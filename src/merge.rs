//! Merge graph construction
//!
//! Turns the pairwise merge table (parent, left child, right child,
//! distance, parent name) into a parent -> children adjacency. A parent may
//! appear in several rows; its children are deduplicated in first-seen
//! order.

use crate::ids::{coerce_float, normalize_id, OUTLIER_TOPIC};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the merge table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeRow {
    #[serde(default, alias = "Parent_ID")]
    pub parent_id: Value,
    #[serde(default, alias = "Child_Left_ID")]
    pub child_left_id: Value,
    #[serde(default, alias = "Child_Right_ID")]
    pub child_right_id: Value,
    #[serde(default, alias = "Distance")]
    pub distance: Value,
    #[serde(default, alias = "Parent_Name")]
    pub parent_name: Value,
}

impl MergeRow {
    /// Create a merge row from typed ids
    pub fn new(parent_id: i64, child_left_id: i64, child_right_id: i64) -> Self {
        Self {
            parent_id: parent_id.into(),
            child_left_id: child_left_id.into(),
            child_right_id: child_right_id.into(),
            distance: Value::Null,
            parent_name: Value::Null,
        }
    }

    /// Builder method: set the merge distance
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance.into();
        self
    }

    /// Builder method: set the parent display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.parent_name = Value::String(name.into());
        self
    }
}

/// Parent -> children adjacency derived from the merge table
#[derive(Debug, Clone, Default)]
pub struct MergeGraph {
    children: FxHashMap<i64, Vec<i64>>,
    /// Parent ids in first-seen order
    parents: Vec<i64>,
    labels: FxHashMap<i64, String>,
    children_seen: FxHashSet<i64>,
    /// Rows dropped for an unresolvable parent or child id
    pub dropped_rows: usize,
    /// Rows cut by the distance threshold
    pub pruned_rows: usize,
}

impl MergeGraph {
    /// Build the adjacency from merge rows.
    ///
    /// Rows with an unresolvable id are dropped. When `max_distance` is set,
    /// rows with a known distance above it are cut; rows without a
    /// distance are always kept.
    pub fn from_rows(rows: &[MergeRow], max_distance: Option<f64>) -> Self {
        let mut graph = Self::default();

        for row in rows {
            let ids = (
                normalize_id(&row.parent_id).get(),
                normalize_id(&row.child_left_id).get(),
                normalize_id(&row.child_right_id).get(),
            );
            let (Some(parent), Some(left), Some(right)) = ids else {
                graph.dropped_rows += 1;
                continue;
            };
            if parent == OUTLIER_TOPIC {
                graph.dropped_rows += 1;
                continue;
            }

            let distance = coerce_float(&row.distance);
            if let (Some(limit), Some(d)) = (max_distance, distance) {
                if d > limit {
                    graph.pruned_rows += 1;
                    continue;
                }
            }

            graph.add_merge(parent, left, right);
            if let Value::String(name) = &row.parent_name {
                let name = name.trim();
                if !name.is_empty() {
                    graph.labels.insert(parent, name.to_string());
                }
            }
        }

        graph
    }

    /// Record that `parent` merges `left` and `right`.
    ///
    /// The outlier sentinel is never recorded as a child.
    pub fn add_merge(&mut self, parent: i64, left: i64, right: i64) {
        let children = self.children.entry(parent).or_insert_with(|| {
            self.parents.push(parent);
            Vec::with_capacity(2)
        });
        for child in [left, right] {
            if child != OUTLIER_TOPIC && !children.contains(&child) {
                children.push(child);
            }
        }
        for child in [left, right] {
            if child != OUTLIER_TOPIC {
                self.children_seen.insert(child);
            }
        }
    }

    /// Children of a node (empty for leaves)
    pub fn children(&self, node_id: i64) -> &[i64] {
        self.children.get(&node_id).map_or(&[], Vec::as_slice)
    }

    /// Explicit parent name from the merge table
    pub fn label(&self, node_id: i64) -> Option<&str> {
        self.labels.get(&node_id).map(String::as_str)
    }

    /// Parent ids in first-seen order
    pub fn parents(&self) -> &[i64] {
        &self.parents
    }

    /// Check if an id appears as a parent
    pub fn is_parent(&self, node_id: i64) -> bool {
        self.children.contains_key(&node_id)
    }

    /// Check if an id appears as someone's child
    pub fn is_child(&self, node_id: i64) -> bool {
        self.children_seen.contains(&node_id)
    }

    /// Number of distinct parents
    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Root candidates, ascending.
    ///
    /// Parents that never appear as a child. When every parent is also a
    /// child somewhere, the largest parent id is the root.
    pub fn roots(&self) -> Vec<i64> {
        let mut roots: Vec<i64> = self
            .parents
            .iter()
            .copied()
            .filter(|p| !self.children_seen.contains(p))
            .collect();
        roots.sort_unstable();
        if roots.is_empty() {
            if let Some(&largest) = self.parents.iter().max() {
                roots.push(largest);
            }
        }
        roots
    }
}
