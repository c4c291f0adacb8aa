// The transport contract the planner binds leaves and internal nodes to.
// The actor/RPC layer that actually ships bytes between nodes is external to
// this crate; only the `dispatch` contract is consumed here.

use std::{fmt, pin::Pin};

use futures::future::BoxFuture;

use crate::plan::ExecPlan;

/// Whatever comes back from executing a subtree. Dispatch failures are
/// embedded here rather than surfaced as an `Err` from `dispatch` itself,
/// matching the at-most-once, best-effort nature of the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResponse {
    Success { result: Vec<u8> },
    Failed { error: String },
}

pub type DispatchFuture = Pin<Box<dyn futures::Future<Output = QueryResponse> + Send>>;

/// A transport endpoint capable of executing a subtree on the node that
/// owns the shards it touches. Implementations are expected to be cheap to
/// clone (an `Arc` around a connection handle, typically).
pub trait PlanDispatcher: fmt::Debug + Send + Sync {
    /// Stable identity of the endpoint this dispatcher targets. Used by the
    /// planner to de-duplicate dispatchers collected from several children
    /// before picking one at random.
    fn id(&self) -> &str;

    fn dispatch(&self, plan: ExecPlan) -> DispatchFuture;
}

/// A dispatcher that never leaves the calling process. Useful for tests and
/// for single-shard datasets where shard and coordinator are co-located.
#[derive(Debug, Clone)]
pub struct LocalPlanDispatcher {
    id: String,
}

impl LocalPlanDispatcher {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl PlanDispatcher for LocalPlanDispatcher {
    fn id(&self) -> &str {
        &self.id
    }

    fn dispatch(&self, _plan: ExecPlan) -> BoxFuture<'static, QueryResponse> {
        Box::pin(async move {
            QueryResponse::Failed {
                error: "LocalPlanDispatcher does not execute plans".to_string(),
            }
        })
    }
}
