use std::{collections::HashSet, sync::Arc};

use logical::{AggregationOperator, BinaryOperator, Cardinality, ColumnFilter, FunctionArg, RangeSelector};

use crate::{dispatch::PlanDispatcher, transformers::RangeVectorTransformer};

/// Variant-specific payload of an exec node. Children are modeled per
/// variant rather than as a single uniform list because `BinaryJoinExec`
/// genuinely has two independently-resolved child groups.
#[derive(Debug, Clone)]
pub enum ExecNode {
    SelectRawPartitions {
        dataset: String,
        shard: i32,
        filters: Vec<ColumnFilter>,
        row_key_range: RangeSelector,
        columns: Vec<String>,
    },
    DistConcat {
        children: Vec<ExecPlan>,
    },
    ReduceAggregate {
        children: Vec<ExecPlan>,
        operator: AggregationOperator,
        params: Vec<FunctionArg>,
    },
    BinaryJoin {
        lhs: Vec<ExecPlan>,
        rhs: Vec<ExecPlan>,
        operator: BinaryOperator,
        cardinality: Cardinality,
        on: Vec<String>,
        ignoring: Vec<String>,
    },
}

impl ExecNode {
    fn tag(&self) -> &'static str {
        match self {
            ExecNode::SelectRawPartitions { .. } => "SelectRawPartitionsExec",
            ExecNode::DistConcat { .. } => "DistConcatExec",
            ExecNode::ReduceAggregate { .. } => "ReduceAggregateExec",
            ExecNode::BinaryJoin { .. } => "BinaryJoinExec",
        }
    }

    /// All direct children, flattening `BinaryJoin`'s lhs/rhs groups into
    /// one list. Leaves return an empty slice.
    pub fn children(&self) -> Vec<&ExecPlan> {
        match self {
            ExecNode::SelectRawPartitions { .. } => Vec::new(),
            ExecNode::DistConcat { children } | ExecNode::ReduceAggregate { children, .. } => {
                children.iter().collect()
            }
            ExecNode::BinaryJoin { lhs, rhs, .. } => lhs.iter().chain(rhs.iter()).collect(),
        }
    }
}

/// A node of the executable physical tree. Immutable after the planner
/// returns, except for `transformers`, which is appended to during
/// materialization and frozen before dispatch.
#[derive(Debug, Clone)]
pub struct ExecPlan {
    pub query_id: String,
    pub submit_time: i64,
    pub dispatcher: Arc<dyn PlanDispatcher>,
    pub node: ExecNode,
    transformers: Vec<RangeVectorTransformer>,
    frozen: bool,
}

impl ExecPlan {
    pub fn new(
        query_id: impl Into<String>,
        submit_time: i64,
        dispatcher: Arc<dyn PlanDispatcher>,
        node: ExecNode,
    ) -> Self {
        Self {
            query_id: query_id.into(),
            submit_time,
            dispatcher,
            node,
            transformers: Vec::new(),
            frozen: false,
        }
    }

    pub fn children(&self) -> Vec<&ExecPlan> {
        self.node.children()
    }

    pub fn transformers(&self) -> &[RangeVectorTransformer] {
        &self.transformers
    }

    /// Appends a transformer to this node's ordered chain. Must only be
    /// called during materialization, before `freeze`.
    pub fn add_range_vector_transformer(&mut self, transformer: RangeVectorTransformer) {
        debug_assert!(
            !self.frozen,
            "attempted to append a transformer to a frozen ExecPlan"
        );
        self.transformers.push(transformer);
    }

    /// Freezes the transformer chain. The planner calls this on every node
    /// right before returning the materialized tree to the caller.
    pub fn freeze(&mut self) {
        self.frozen = true;
        for child in self.node_children_mut() {
            child.freeze();
        }
    }

    fn node_children_mut(&mut self) -> Vec<&mut ExecPlan> {
        match &mut self.node {
            ExecNode::SelectRawPartitions { .. } => Vec::new(),
            ExecNode::DistConcat { children } | ExecNode::ReduceAggregate { children, .. } => {
                children.iter_mut().collect()
            }
            ExecNode::BinaryJoin { lhs, rhs, .. } => {
                lhs.iter_mut().chain(rhs.iter_mut()).collect()
            }
        }
    }

    /// Deterministic, indent-based rendering for debugging.
    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        self.print_tree_indent(0, &mut out);
        out
    }

    fn print_tree_indent(&self, depth: usize, out: &mut String) {
        let pad = "  ".repeat(depth);
        out.push_str(&pad);
        out.push_str(self.node.tag());
        out.push_str(" (dispatcher=");
        out.push_str(self.dispatcher.id());
        out.push(')');
        for t in &self.transformers {
            out.push('\n');
            out.push_str(&"  ".repeat(depth + 1));
            out.push_str("-> ");
            out.push_str(t.name());
        }
        for child in self.children() {
            out.push('\n');
            child.print_tree_indent(depth + 1, out);
        }
    }

    /// Every node's dispatcher must be its own or one of its children's.
    /// Testable property from spec §8.1.
    pub fn dispatcher_containment_holds(&self) -> bool {
        let children = self.children();
        let ok = children.is_empty() || children.iter().any(|c| c.dispatcher.id() == self.dispatcher.id());
        ok && children.iter().all(|c| c.dispatcher_containment_holds())
    }

    /// The set of distinct `queryId`s found anywhere in the tree. A valid
    /// materialization always yields a singleton set.
    pub fn collect_query_ids<'a>(&'a self, into: &mut HashSet<&'a str>) {
        into.insert(&self.query_id);
        for child in self.children() {
            child.collect_query_ids(into);
        }
    }
}
