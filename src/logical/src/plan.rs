// Immutable tagged tree describing a query against time-series datasets.
//
// The tree is built once by the caller (e.g. a PromQL/SQL front end, out of
// scope here) and handed to the planner for materialization. Nothing in this
// module executes a query; it only describes one.

use serde::{Deserialize, Serialize};

/// A single scalar or string argument to an aggregation/instant function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FunctionArg {
    Scalar(f64),
    Str(String),
}

/// The value side of an equality/inequality filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Predicate applied to a single column. Only `Equals(FilterValue::Str(_))`
/// is understood by the shard resolver; any other variant on a shard-key
/// column is a planning error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Equals(FilterValue),
    NotEquals(FilterValue),
    In(Vec<String>),
    NotIn(Vec<String>),
    Regex(String),
    NotRegex(String),
}

impl Filter {
    /// Returns the string literal if this is an `Equals(Str(_))` filter.
    pub fn as_equals_str(&self) -> Option<&str> {
        match self {
            Filter::Equals(FilterValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub filter: Filter,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, filter: Filter) -> Self {
        Self {
            column: column.into(),
            filter,
        }
    }
}

/// Which chunks of a raw partition a scan should read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RangeSelector {
    IntervalSelector { from: i64, to: i64 },
    AllChunks,
    EncodedChunks,
    WriteBuffers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationOperator {
    Sum,
    Min,
    Max,
    Count,
    Avg,
    Stdvar,
    Stddev,
    TopK,
    BottomK,
    Quantile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eql,
    Neq,
    Gtr,
    Lss,
    Gte,
    Lte,
    And,
    Or,
    Unless,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// The logical query tree. Leaves are `RawSeries`; every other variant wraps
/// one or two child plans and describes a transformation or combination of
/// their outputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LogicalPlan {
    RawSeries {
        filters: Vec<ColumnFilter>,
        columns: Vec<String>,
        range_selector: RangeSelector,
    },
    PeriodicSeries {
        raw_series: Box<LogicalPlan>,
        start: i64,
        step: i64,
        end: i64,
    },
    PeriodicSeriesWithWindowing {
        raw_series: Box<LogicalPlan>,
        start: i64,
        step: i64,
        end: i64,
        window: i64,
        function: String,
        function_args: Vec<FunctionArg>,
    },
    ApplyInstantFunction {
        vectors: Box<LogicalPlan>,
        function: String,
        function_args: Vec<FunctionArg>,
    },
    Aggregate {
        vectors: Box<LogicalPlan>,
        operator: AggregationOperator,
        params: Vec<FunctionArg>,
        without: Vec<String>,
        by: Vec<String>,
    },
    BinaryJoin {
        lhs: Box<LogicalPlan>,
        rhs: Box<LogicalPlan>,
        operator: BinaryOperator,
        cardinality: Cardinality,
        on: Vec<String>,
        ignoring: Vec<String>,
    },
    ScalarVectorBinaryOperation {
        vector: Box<LogicalPlan>,
        operator: BinaryOperator,
        scalar: f64,
        scalar_is_lhs: bool,
    },
}

impl LogicalPlan {
    /// Filters carried by the `RawSeries` leaf, if this node is one or wraps
    /// exactly one on the way down through single-child variants. The
    /// planner only calls this on `RawSeries` itself; kept here for tests.
    pub fn is_raw_series(&self) -> bool {
        matches!(self, LogicalPlan::RawSeries { .. })
    }
}
