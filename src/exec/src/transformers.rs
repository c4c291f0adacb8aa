// Pure, per-node stream transforms appended to an `ExecPlan` during
// materialization. Each one consumes a stream of range vectors and produces
// a stream of range vectors; the actual stream machinery lives with the
// remote executor and is out of scope here. This module only carries the
// (ordered, wire-serializable) description of the chain.

use logical::{AggregationOperator, BinaryOperator, FunctionArg};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RangeVectorTransformer {
    PeriodicSamplesMapper {
        start: i64,
        step: i64,
        end: i64,
        window: Option<i64>,
        function: Option<String>,
        function_args: Vec<FunctionArg>,
    },
    InstantVectorFunctionMapper {
        function: String,
        function_args: Vec<FunctionArg>,
    },
    AggregateMapReduce {
        operator: AggregationOperator,
        params: Vec<FunctionArg>,
        without: Vec<String>,
        by: Vec<String>,
    },
    AggregatePresenter {
        operator: AggregationOperator,
        params: Vec<FunctionArg>,
    },
    ScalarOperationMapper {
        operator: BinaryOperator,
        scalar: f64,
        scalar_is_lhs: bool,
    },
}

impl RangeVectorTransformer {
    pub fn name(&self) -> &'static str {
        match self {
            RangeVectorTransformer::PeriodicSamplesMapper { .. } => "PeriodicSamplesMapper",
            RangeVectorTransformer::InstantVectorFunctionMapper { .. } => {
                "InstantVectorFunctionMapper"
            }
            RangeVectorTransformer::AggregateMapReduce { .. } => "AggregateMapReduce",
            RangeVectorTransformer::AggregatePresenter { .. } => "AggregatePresenter",
            RangeVectorTransformer::ScalarOperationMapper { .. } => "ScalarOperationMapper",
        }
    }
}
