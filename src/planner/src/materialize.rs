use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use exec::{ExecNode, ExecPlan, RangeVectorTransformer};
use logical::{LogicalPlan, RangeSelector};
use uuid::Uuid;

use crate::{
    dataset::Dataset,
    dispatcher::{dispatcher_for_shard, pick_dispatcher},
    errors::{Error, Result},
    options::QueryOptions,
    resolver::shards_from_filters,
    shardmap::ShardMap,
};

/// Walks `RangeSelector` into the exec-level row-key range. Written as an
/// exhaustive match rather than a default-with-fallthrough: adding a new
/// selector variant will fail to compile here until this function is
/// updated, rather than silently routing it through an existing case.
fn to_row_key_range(selector: &RangeSelector) -> RangeSelector {
    match selector {
        RangeSelector::IntervalSelector { from, to } => RangeSelector::IntervalSelector {
            from: *from,
            to: *to,
        },
        RangeSelector::AllChunks => RangeSelector::AllChunks,
        RangeSelector::EncodedChunks => RangeSelector::EncodedChunks,
        RangeSelector::WriteBuffers => RangeSelector::WriteBuffers,
    }
}

/// Translates a logical query tree into an executable physical tree bound
/// to concrete shard dispatchers.
pub struct Planner {
    shard_map: Arc<dyn ShardMap>,
}

impl Planner {
    pub fn new(shard_map: Arc<dyn ShardMap>) -> Self {
        Self { shard_map }
    }

    /// `materialize` (§4.1). Never returns a partial plan: any error aborts
    /// the whole materialization.
    pub fn materialize(
        &self,
        dataset: &Dataset,
        root: &LogicalPlan,
        options: &QueryOptions,
    ) -> Result<ExecPlan> {
        let query_id = Uuid::now_v7().to_string();
        let submit_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_millis() as i64;

        tracing::debug!(query_id, submit_time, "materializing query plan");

        let mut plans = self.walk(dataset, root, &query_id, submit_time, options)?;
        let mut result = if plans.len() == 1 {
            plans.pop().unwrap()
        } else {
            let refs: Vec<&ExecPlan> = plans.iter().collect();
            let dispatcher = pick_dispatcher(&refs);
            ExecPlan::new(
                query_id,
                submit_time,
                dispatcher,
                ExecNode::DistConcat { children: plans },
            )
        };
        result.freeze();
        Ok(result)
    }

    fn walk(
        &self,
        dataset: &Dataset,
        plan: &LogicalPlan,
        query_id: &str,
        submit_time: i64,
        options: &QueryOptions,
    ) -> Result<Vec<ExecPlan>> {
        match plan {
            LogicalPlan::RawSeries {
                filters,
                columns,
                range_selector,
            } => {
                let shards =
                    shards_from_filters(dataset, filters, options, self.shard_map.as_ref())?;
                if shards.is_empty() {
                    return Err(Error::ShardsUnavailable(Vec::new()));
                }
                shards
                    .into_iter()
                    .map(|shard| {
                        let dispatcher = dispatcher_for_shard(shard, self.shard_map.as_ref())?;
                        Ok(ExecPlan::new(
                            query_id.to_string(),
                            submit_time,
                            dispatcher,
                            ExecNode::SelectRawPartitions {
                                dataset: dataset.name.clone(),
                                shard,
                                filters: filters.clone(),
                                row_key_range: to_row_key_range(range_selector),
                                columns: columns.clone(),
                            },
                        ))
                    })
                    .collect()
            }

            LogicalPlan::PeriodicSeries {
                raw_series,
                start,
                step,
                end,
            } => {
                let mut children =
                    self.walk(dataset, raw_series, query_id, submit_time, options)?;
                for child in &mut children {
                    child.add_range_vector_transformer(RangeVectorTransformer::PeriodicSamplesMapper {
                        start: *start,
                        step: *step,
                        end: *end,
                        window: None,
                        function: None,
                        function_args: Vec::new(),
                    });
                }
                Ok(children)
            }

            LogicalPlan::PeriodicSeriesWithWindowing {
                raw_series,
                start,
                step,
                end,
                window,
                function,
                function_args,
            } => {
                let mut children =
                    self.walk(dataset, raw_series, query_id, submit_time, options)?;
                for child in &mut children {
                    child.add_range_vector_transformer(RangeVectorTransformer::PeriodicSamplesMapper {
                        start: *start,
                        step: *step,
                        end: *end,
                        window: Some(*window),
                        function: Some(function.clone()),
                        function_args: function_args.clone(),
                    });
                }
                Ok(children)
            }

            LogicalPlan::ApplyInstantFunction {
                vectors,
                function,
                function_args,
            } => {
                let mut children = self.walk(dataset, vectors, query_id, submit_time, options)?;
                for child in &mut children {
                    child.add_range_vector_transformer(RangeVectorTransformer::InstantVectorFunctionMapper {
                        function: function.clone(),
                        function_args: function_args.clone(),
                    });
                }
                Ok(children)
            }

            LogicalPlan::ScalarVectorBinaryOperation {
                vector,
                operator,
                scalar,
                scalar_is_lhs,
            } => {
                let mut children = self.walk(dataset, vector, query_id, submit_time, options)?;
                for child in &mut children {
                    child.add_range_vector_transformer(RangeVectorTransformer::ScalarOperationMapper {
                        operator: *operator,
                        scalar: *scalar,
                        scalar_is_lhs: *scalar_is_lhs,
                    });
                }
                Ok(children)
            }

            LogicalPlan::Aggregate {
                vectors,
                operator,
                params,
                without,
                by,
            } => {
                let mut children = self.walk(dataset, vectors, query_id, submit_time, options)?;
                for child in &mut children {
                    child.add_range_vector_transformer(RangeVectorTransformer::AggregateMapReduce {
                        operator: *operator,
                        params: params.clone(),
                        without: without.clone(),
                        by: by.clone(),
                    });
                }
                let refs: Vec<&ExecPlan> = children.iter().collect();
                let dispatcher = pick_dispatcher(&refs);
                let mut reducer = ExecPlan::new(
                    query_id.to_string(),
                    submit_time,
                    dispatcher,
                    ExecNode::ReduceAggregate {
                        children,
                        operator: *operator,
                        params: params.clone(),
                    },
                );
                reducer.add_range_vector_transformer(RangeVectorTransformer::AggregatePresenter {
                    operator: *operator,
                    params: params.clone(),
                });
                Ok(vec![reducer])
            }

            LogicalPlan::BinaryJoin {
                lhs,
                rhs,
                operator,
                cardinality,
                on,
                ignoring,
            } => {
                let lhs_children = self.walk(dataset, lhs, query_id, submit_time, options)?;
                let rhs_children = self.walk(dataset, rhs, query_id, submit_time, options)?;
                let refs: Vec<&ExecPlan> = lhs_children.iter().chain(rhs_children.iter()).collect();
                let dispatcher = pick_dispatcher(&refs);
                let node = ExecNode::BinaryJoin {
                    lhs: lhs_children,
                    rhs: rhs_children,
                    operator: *operator,
                    cardinality: *cardinality,
                    on: on.clone(),
                    ignoring: ignoring.clone(),
                };
                Ok(vec![ExecPlan::new(query_id.to_string(), submit_time, dispatcher, node)])
            }
        }
    }
}
