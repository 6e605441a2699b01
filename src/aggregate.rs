//! Tree aggregation
//!
//! Walks the merge graph depth-first from each root, assigning levels and
//! finalizing every internal node after its children: size becomes the sum
//! of the children's sizes, terms become the size-weighted merge of the
//! children's terms, and a label is derived when none was given.
//!
//! Nodes live in a [`TopicArena`] keyed by topic id. The walk uses an
//! explicit stack and a visited set, so shared children are finalized once
//! and deep dendrograms cannot exhaust the call stack.

use crate::merge::MergeGraph;
use crate::types::{placeholder_label, rank_terms, TopicNode, TopicTerm, LABEL_TERM_COUNT};
use rustc_hash::{FxHashMap, FxHashSet};

/// Topic id -> node storage for one build
#[derive(Debug, Clone, Default)]
pub struct TopicArena {
    nodes: FxHashMap<i64, TopicNode>,
}

enum Frame {
    Enter {
        node_id: i64,
        level: usize,
        parent_id: Option<i64>,
    },
    Exit(i64),
}

impl TopicArena {
    /// Create an arena from already-built nodes
    pub fn from_nodes(nodes: impl IntoIterator<Item = TopicNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.topic_id, n)).collect(),
        }
    }

    pub fn get(&self, topic_id: i64) -> Option<&TopicNode> {
        self.nodes.get(&topic_id)
    }

    pub fn contains(&self, topic_id: i64) -> bool {
        self.nodes.contains_key(&topic_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn get_or_stub(&mut self, topic_id: i64) -> &mut TopicNode {
        self.nodes
            .entry(topic_id)
            .or_insert_with(|| TopicNode::stub(topic_id))
    }

    fn size_of(&self, topic_id: i64) -> usize {
        self.nodes.get(&topic_id).map_or(0, |n| n.size)
    }

    /// Make sure every merge parent exists as a node.
    ///
    /// Missing parents become stubs. Existing nodes take the merge table's
    /// parent name and drop their direct documents, since their size will
    /// come from their children.
    pub fn materialize_parents(&mut self, graph: &MergeGraph) {
        for &parent_id in graph.parents() {
            let node = self.get_or_stub(parent_id);
            if let Some(label) = graph.label(parent_id) {
                node.label = label.to_string();
            }
            node.docs.clear();
        }
    }

    /// Assign levels and finalize sizes, terms and labels.
    ///
    /// Walks from each of `roots`, or from every node (ascending id) when
    /// there are no roots.
    pub fn aggregate(&mut self, graph: &MergeGraph, roots: &[i64], top_n: usize) {
        let mut visited: FxHashSet<i64> = FxHashSet::default();
        let starts: Vec<i64> = if roots.is_empty() {
            let mut ids: Vec<i64> = self.nodes.keys().copied().collect();
            ids.sort_unstable();
            ids
        } else {
            roots.to_vec()
        };

        for start in starts {
            if let Some(node) = self.nodes.get_mut(&start) {
                node.parent_id = None;
            }
            self.walk(graph, start, top_n, &mut visited);
        }
    }

    fn walk(&mut self, graph: &MergeGraph, root: i64, top_n: usize, visited: &mut FxHashSet<i64>) {
        let mut stack = vec![Frame::Enter {
            node_id: root,
            level: 0,
            parent_id: None,
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter {
                    node_id,
                    level,
                    parent_id,
                } => {
                    // Already walked (or in progress): its current size is used as-is.
                    if !visited.insert(node_id) {
                        continue;
                    }
                    let node = self.get_or_stub(node_id);
                    node.level = level;
                    if parent_id.is_some() {
                        node.parent_id = parent_id;
                    }

                    let children = graph.children(node_id);
                    if children.is_empty() {
                        continue;
                    }
                    stack.push(Frame::Exit(node_id));
                    for &child_id in children.iter().rev() {
                        stack.push(Frame::Enter {
                            node_id: child_id,
                            level: level + 1,
                            parent_id: Some(node_id),
                        });
                    }
                }
                Frame::Exit(node_id) => self.finalize(graph, node_id, top_n),
            }
        }
    }

    fn finalize(&mut self, graph: &MergeGraph, node_id: i64, top_n: usize) {
        let children = graph.children(node_id);
        let total = children
            .iter()
            .map(|&c| self.size_of(c))
            .fold(0, usize::saturating_add);
        let needs_terms = self.nodes.get(&node_id).is_some_and(|n| n.terms.is_empty());
        let merged = if needs_terms {
            self.aggregate_terms(children, top_n)
        } else {
            Vec::new()
        };

        let Some(node) = self.nodes.get_mut(&node_id) else {
            return;
        };
        if node.docs.is_empty() {
            node.size = total;
        }
        if needs_terms {
            node.terms = merged;
        }

        if let Some(label) = graph.label(node_id) {
            node.label = label.to_string();
        } else if node.has_placeholder_label() {
            node.label = derived_label(&node.terms).unwrap_or_else(|| placeholder_label(node_id));
        }
    }

    /// Size-weighted merge of the children's terms.
    ///
    /// Each child's term score is multiplied by `max(child.size, 1)` and
    /// summed per trimmed term text. Totals are sorted descending (ties in
    /// first-seen order) and cut to `top_n`.
    pub fn aggregate_terms(&self, children: &[i64], top_n: usize) -> Vec<TopicTerm> {
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        let mut totals: Vec<TopicTerm> = Vec::new();

        for child in children.iter().filter_map(|c| self.nodes.get(c)) {
            let weight = child.size.max(1) as f64;
            for term in &child.terms {
                let key = term.term.trim();
                if key.is_empty() {
                    continue;
                }
                let slot = *index.entry(key).or_insert_with(|| {
                    totals.push(TopicTerm::new(key, 0.0, totals.len() + 1));
                    totals.len() - 1
                });
                totals[slot].score += term.score * weight;
            }
        }

        rank_terms(totals, top_n)
    }

    /// Nodes ordered by ascending level, then ascending topic id
    pub fn into_sorted_nodes(self) -> Vec<TopicNode> {
        let mut nodes: Vec<TopicNode> = self.nodes.into_values().collect();
        nodes.sort_by_key(|n| (n.level, n.topic_id));
        nodes
    }
}

/// Label from the top aggregated terms, joined with spaces.
pub fn derived_label(terms: &[TopicTerm]) -> Option<String> {
    let words: Vec<&str> = terms
        .iter()
        .take(LABEL_TERM_COUNT)
        .map(|t| t.term.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}
