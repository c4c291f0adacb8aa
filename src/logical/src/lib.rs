pub mod plan;

pub use plan::{
    AggregationOperator, BinaryOperator, Cardinality, ColumnFilter, Filter, FilterValue,
    FunctionArg, LogicalPlan, RangeSelector,
};
