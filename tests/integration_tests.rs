//! Integration tests for topic_tree

use serde_json::{json, Value};
use topic_tree::*;

/// Four documents: one outlier, two in cluster 0, one in cluster 1
fn sample_tables() -> ClusterTables {
    ClusterTables::from_assignments(vec![1, 2, 3, 4], &[-1, 0, 0, 1])
        .with_probabilities(vec![
            vec![0.9, 0.1],
            vec![0.2, 0.8],
            vec![0.7, 0.3],
            vec![0.4, 0.6],
        ])
        .with_summaries(vec![
            SummaryRow::new(-1, 1, "-1_noise"),
            SummaryRow::new(0, 2, "0_cat_pet").with_probability(0.75),
            SummaryRow::new(1, 1, "1_dog_pet"),
        ])
        .with_terms(vec![
            ClusterTerms::new(0, vec![("cat", 0.6), ("pet", 0.3)]),
            ClusterTerms::new(1, vec![("dog", 0.5), ("pet", 0.4)]),
        ])
}

fn with_merge(tables: ClusterTables) -> ClusterTables {
    tables.with_merges(vec![MergeRow::new(2, 0, 1).with_distance(0.5)])
}

fn doc_ids(node: &TopicNode) -> Vec<i64> {
    node.docs.iter().map(|d| d.id).collect()
}

#[test]
fn test_flat_build_without_merges() {
    let map = TopicTreeBuilder::new().build(&sample_tables());

    assert_eq!(map.len(), 2);
    assert_eq!(map.leaves().count(), 2);

    let zero = map.node(0).unwrap();
    assert_eq!(doc_ids(zero), vec![2, 3]);
    assert_eq!(zero.size, 2);
    assert_eq!(zero.label, "0_cat_pet");
    assert_eq!(zero.score, Some(0.75));

    let one = map.node(1).unwrap();
    assert_eq!(doc_ids(one), vec![4]);
    assert_eq!(one.size, 1);

    assert_eq!(map.diagnostics.roots, 0);
    assert!(!map.diagnostics.has_links);
    assert_eq!(map.diagnostics.leaf_count, 2);
    assert_eq!(map.stats.outliers, 1);
    assert!(map.node(OUTLIER_TOPIC).is_none());
}

#[test]
fn test_merge_pruned_by_max_distance() {
    let map = TopicTreeBuilder::new()
        .with_max_distance(0.3)
        .build(&with_merge(sample_tables()));

    assert!(map.node(2).is_none());
    let roots: Vec<i64> = map.roots().map(|n| n.topic_id).collect();
    assert_eq!(roots, vec![0, 1]);
    assert!(map.nodes.iter().all(|n| n.level == 0));
    assert!(!map.diagnostics.has_links);
}

#[test]
fn test_merge_kept_at_threshold() {
    for max_distance in [None, Some(0.5), Some(0.9)] {
        let mut builder = TopicTreeBuilder::new();
        if let Some(limit) = max_distance {
            builder = builder.with_max_distance(limit);
        }
        let map = builder.build(&with_merge(sample_tables()));

        let parent = map.node(2).unwrap();
        assert_eq!(parent.level, 0);
        assert!(parent.is_root());
        assert!(parent.docs.is_empty());

        let children: Vec<i64> = map.children(2).iter().map(|n| n.topic_id).collect();
        assert_eq!(children, vec![0, 1]);
        assert!(map.children(2).iter().all(|n| n.level == 1));
        assert_eq!(parent.size, map.node(0).unwrap().size + map.node(1).unwrap().size);
        assert_eq!(map.diagnostics.roots, 1);
        assert_eq!(map.diagnostics.parents_emitted, 1);
        assert!(map.diagnostics.has_links);
    }
}

#[test]
fn test_parent_terms_are_size_weighted() {
    let map = TopicTreeBuilder::new().build(&with_merge(sample_tables()));
    let parent = map.node(2).unwrap();

    let terms: Vec<&str> = parent.terms.iter().map(|t| t.term.as_str()).collect();
    assert_eq!(terms, vec!["cat", "pet", "dog"]);
    // cat: 0.6 * 2, pet: 0.3 * 2 + 0.4 * 1, dog: 0.5 * 1
    assert!((parent.terms[0].score - 1.2).abs() < 1e-9);
    assert!((parent.terms[1].score - 1.0).abs() < 1e-9);
    assert!((parent.terms[2].score - 0.5).abs() < 1e-9);
    let ranks: Vec<usize> = parent.terms.iter().map(|t| t.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(parent.label, "cat pet dog");
}

#[test]
fn test_merge_table_name_overrides_label() {
    let tables = sample_tables()
        .with_merges(vec![MergeRow::new(2, 0, 1).with_name("Animals")]);
    let map = TopicTreeBuilder::new().build(&tables);
    assert_eq!(map.node(2).unwrap().label, "Animals");
}

#[test]
fn test_cluster_missing_from_summaries() {
    let tables = ClusterTables::from_assignments(vec![10, 11, 12], &[0, 7, 7])
        .with_summaries(vec![SummaryRow::new(0, 1, "0_alpha")]);
    let map = TopicTreeBuilder::new().build(&tables);

    let seven = map.node(7).unwrap();
    assert_eq!(seven.size, 2);
    assert_eq!(seven.label, "Topic 7");
    assert_eq!(doc_ids(seven), vec![11, 12]);
}

#[test]
fn test_formatted_ids_resolve() {
    let tables = ClusterTables::new(
        vec![1, 2, 3],
        vec![json!("Topic 3"), json!(3.0), json!("cluster_3")],
    )
    .with_merges(vec![MergeRow {
        parent_id: json!("Topic 9"),
        child_left_id: json!("3"),
        child_right_id: json!(4),
        ..MergeRow::default()
    }]);
    let map = TopicTreeBuilder::new().build(&tables);

    assert_eq!(map.node(3).unwrap().size, 3);
    assert_eq!(map.node(3).unwrap().parent_id, Some(9));
    assert_eq!(map.node(9).unwrap().size, 3);
}

#[test]
fn test_shared_child_keeps_first_parent() {
    let tables = ClusterTables::from_assignments(vec![1, 2, 3], &[0, 1, 2]).with_merges(vec![
        MergeRow::new(5, 0, 1),
        MergeRow::new(6, 1, 2),
        MergeRow::new(7, 5, 6),
    ]);
    let map = TopicTreeBuilder::new().build(&tables);

    assert_eq!(map.node(7).unwrap().level, 0);
    assert_eq!(map.node(1).unwrap().parent_id, Some(5));
    assert_eq!(map.node(1).unwrap().level, 2);
}

#[test]
fn test_config_top_n_limits_terms() {
    let tables = ClusterTables::from_assignments(vec![1], &[0]).with_terms(vec![ClusterTerms::new(
        0,
        vec![("a", 0.1), ("b", 0.5), ("c", 0.3), ("d", 0.2)],
    )]);
    let config = TopicTreeConfig::default().with_top_n_terms(2);
    let map = build_topic_tree(&tables, &config);

    let terms: Vec<&str> = map.nodes[0].terms.iter().map(|t| t.term.as_str()).collect();
    // the first two upstream entries, reordered by score
    assert_eq!(terms, vec!["b", "a"]);
}

#[test]
fn test_json_end_to_end() {
    let input = json!({
        "documents": [{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}],
        "assignments": [-1, 0, 0, 1],
        "topic_info": [
            {"Topic": 0, "Count": 2, "Name": "0_cat_pet"},
            {"Topic": 1, "Count": 1, "Name": "1_dog_pet"}
        ],
        "hierarchy": [
            {"Parent_ID": 2, "Child_Left_ID": 0, "Child_Right_ID": 1, "Distance": 0.5}
        ],
        "params": {"hierarchy": {"max_distance": 0.3, "linkage": "average"}}
    });
    let output: Value = serde_json::from_str(&build_from_json(&input.to_string()).unwrap()).unwrap();

    assert_eq!(output["topics"].as_array().unwrap().len(), 2);
    assert_eq!(output["meta"]["nr_topics"], 2);
    assert_eq!(output["meta"]["has_links"], false);
    assert_eq!(output["meta"]["linkage"], "average");
    assert_eq!(output["meta"]["stats"]["pruned_merge_rows"], 1);
}

#[test]
fn test_json_rows_with_missing_keys_are_skipped() {
    let input = json!({
        "documents": [{"id": 1}, {"id": 2}, {"id": 3}],
        "assignments": [0, 1, 2],
        "topic_info": [
            {"Count": 5, "Name": "no id"},
            {"Topic": 0, "Count": 1, "Name": "0_alpha"}
        ],
        "topic_terms": [
            {"terms": [["orphan", 1.0]]},
            {"cluster_id": 1}
        ],
        "hierarchy": [
            {"Parent_ID": 3, "Child_Left_ID": 2},
            {"Parent_ID": 4, "Child_Left_ID": 0, "Child_Right_ID": 1}
        ]
    });
    let output: Value = serde_json::from_str(&build_from_json(&input.to_string()).unwrap()).unwrap();

    let ids: Vec<i64> = output["topics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["topic_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 4, 0, 1]);
    assert_eq!(output["meta"]["stats"]["skipped_summary_rows"], 1);
    assert_eq!(output["meta"]["stats"]["dropped_merge_rows"], 1);
    assert_eq!(output["meta"]["parents_expected"], 1);
}

#[test]
fn test_huge_reported_counts_do_not_overflow() {
    let tables = ClusterTables::from_assignments(vec![1, 2, 3], &[0, 1, 2])
        .with_summaries(vec![
            SummaryRow::new(0, i64::MAX as usize, "a"),
            SummaryRow::new(1, i64::MAX as usize, "b"),
            SummaryRow::new(2, i64::MAX as usize, "c"),
        ])
        .with_merges(vec![MergeRow::new(10, 0, 1), MergeRow::new(11, 10, 2)]);
    let map = TopicTreeBuilder::new().build(&tables);

    assert_eq!(map.node(11).unwrap().size, usize::MAX);
    assert!(map.node(11).unwrap().is_root());
}

#[test]
fn test_json_rejects_missing_assignments() {
    let err = build_from_json(r#"{"documents": [{"id": 1}], "assignments": []}"#).unwrap_err();
    assert!(err.is_empty_input());
}
