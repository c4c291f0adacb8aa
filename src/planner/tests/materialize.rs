use std::sync::Arc;

use exec::ExecNode;
use logical::{
    AggregationOperator, BinaryOperator, Cardinality, ColumnFilter, Filter, FilterValue,
    LogicalPlan, RangeSelector,
};
use planner::{Dataset, Error, Planner, QueryOptions, StaticShardMap};
use record::hash::shard_key_hash;

fn filter_eq(column: &str, value: &str) -> ColumnFilter {
    ColumnFilter::new(column, Filter::Equals(FilterValue::Str(value.to_string())))
}

fn raw_series(filters: Vec<ColumnFilter>) -> LogicalPlan {
    LogicalPlan::RawSeries {
        filters,
        columns: vec!["value".to_string()],
        range_selector: RangeSelector::AllChunks,
    }
}

fn two_shard_map() -> (StaticShardMap, i32) {
    let hash = shard_key_hash(
        &["job".to_string(), "instance".to_string()],
        &["api".to_string(), "i-1".to_string()],
    );
    let shard_map = StaticShardMap::new()
        .with_route(hash, vec![1, 2])
        .with_coordinator(1, "node-a")
        .with_coordinator(2, "node-b");
    (shard_map, hash)
}

// S1: a simple periodic series over a two-shard dataset materializes into a
// DistConcat of two SelectRawPartitions leaves, each carrying a
// PeriodicSamplesMapper, sharing one queryId.
#[test]
fn s1_periodic_series_over_two_shards() {
    let (shard_map, _hash) = two_shard_map();
    let planner = Planner::new(Arc::new(shard_map));
    let dataset = Dataset::new("metrics", vec!["job".to_string(), "instance".to_string()]);

    let logical = LogicalPlan::PeriodicSeries {
        raw_series: Box::new(raw_series(vec![
            filter_eq("job", "api"),
            filter_eq("instance", "i-1"),
        ])),
        start: 0,
        step: 60_000,
        end: 600_000,
    };

    let exec = planner
        .materialize(&dataset, &logical, &QueryOptions::default())
        .unwrap();

    match &exec.node {
        ExecNode::DistConcat { children } => {
            assert_eq!(children.len(), 2);
            for child in children {
                assert!(matches!(child.node, ExecNode::SelectRawPartitions { .. }));
                assert_eq!(child.transformers().len(), 1);
                assert_eq!(child.transformers()[0].name(), "PeriodicSamplesMapper");
            }
        }
        other => panic!("expected DistConcat, got {other:?}"),
    }

    let mut ids = std::collections::HashSet::new();
    exec.collect_query_ids(&mut ids);
    assert_eq!(ids.len(), 1);
    assert!(exec.dispatcher_containment_holds());
}

// S2: a raw series missing a filter on a declared shard-key column is a
// BadQuery, not a panic or an empty plan.
#[test]
fn s2_missing_shard_key_filter_is_bad_query() {
    let (shard_map, _hash) = two_shard_map();
    let planner = Planner::new(Arc::new(shard_map));
    let dataset = Dataset::new("metrics", vec!["job".to_string(), "instance".to_string()]);

    let logical = raw_series(vec![filter_eq("job", "api")]);

    let err = planner
        .materialize(&dataset, &logical, &QueryOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::BadQuery(_)));
}

// S3: an aggregate over three shards produces one ReduceAggregate with three
// mapped children and an AggregatePresenter on the reducer itself.
#[test]
fn s3_aggregate_over_three_shards() {
    let hash = shard_key_hash(&["job".to_string()], &["api".to_string()]);
    let shard_map = StaticShardMap::new()
        .with_route(hash, vec![1, 2, 3])
        .with_coordinator(1, "node-a")
        .with_coordinator(2, "node-b")
        .with_coordinator(3, "node-c");
    let planner = Planner::new(Arc::new(shard_map));
    let dataset = Dataset::new("metrics", vec!["job".to_string()]);

    let logical = LogicalPlan::Aggregate {
        vectors: Box::new(LogicalPlan::PeriodicSeries {
            raw_series: Box::new(raw_series(vec![filter_eq("job", "api")])),
            start: 0,
            step: 60_000,
            end: 120_000,
        }),
        operator: AggregationOperator::Sum,
        params: Vec::new(),
        without: Vec::new(),
        by: vec!["job".to_string()],
    };

    let exec = planner
        .materialize(&dataset, &logical, &QueryOptions::default())
        .unwrap();

    match &exec.node {
        ExecNode::ReduceAggregate {
            children,
            operator,
            ..
        } => {
            assert_eq!(children.len(), 3);
            assert_eq!(*operator, AggregationOperator::Sum);
            for child in children {
                assert_eq!(child.transformers().len(), 2);
                assert_eq!(child.transformers()[0].name(), "PeriodicSamplesMapper");
                assert_eq!(child.transformers()[1].name(), "AggregateMapReduce");
            }
        }
        other => panic!("expected ReduceAggregate, got {other:?}"),
    }
    assert_eq!(exec.transformers().len(), 1);
    assert_eq!(exec.transformers()[0].name(), "AggregatePresenter");
    assert!(exec.dispatcher_containment_holds());
}

// S4: a binary join across two independently-resolved raw series emits a
// single BinaryJoinExec node with both sides' children intact.
#[test]
fn s4_binary_join_across_datasets() {
    let hash_a = shard_key_hash(&["job".to_string()], &["api".to_string()]);
    let hash_b = shard_key_hash(&["job".to_string()], &["db".to_string()]);
    let shard_map = StaticShardMap::new()
        .with_route(hash_a, vec![1])
        .with_route(hash_b, vec![2])
        .with_coordinator(1, "node-a")
        .with_coordinator(2, "node-b");
    let planner = Planner::new(Arc::new(shard_map));
    let dataset = Dataset::new("metrics", vec!["job".to_string()]);

    let logical = LogicalPlan::BinaryJoin {
        lhs: Box::new(raw_series(vec![filter_eq("job", "api")])),
        rhs: Box::new(raw_series(vec![filter_eq("job", "db")])),
        operator: BinaryOperator::Add,
        cardinality: Cardinality::OneToOne,
        on: vec!["job".to_string()],
        ignoring: Vec::new(),
    };

    let exec = planner
        .materialize(&dataset, &logical, &QueryOptions::default())
        .unwrap();

    match &exec.node {
        ExecNode::BinaryJoin { lhs, rhs, .. } => {
            assert_eq!(lhs.len(), 1);
            assert_eq!(rhs.len(), 1);
        }
        other => panic!("expected BinaryJoin, got {other:?}"),
    }
    assert!(exec.dispatcher_containment_holds());

    let mut ids = std::collections::HashSet::new();
    exec.collect_query_ids(&mut ids);
    assert_eq!(ids.len(), 1);
}

// No shard-key columns and no override is still a BadQuery, never an empty
// ShardsUnavailable plan with no shards named.
#[test]
fn no_shard_key_and_no_override_is_bad_query() {
    let shard_map = StaticShardMap::new();
    let planner = Planner::new(Arc::new(shard_map));
    let dataset = Dataset::new("unsharded", Vec::new());
    let logical = raw_series(Vec::new());

    let err = planner
        .materialize(&dataset, &logical, &QueryOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::BadQuery(_)));
}
