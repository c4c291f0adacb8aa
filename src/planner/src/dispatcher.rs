use std::sync::Arc;

use exec::{DispatchFuture, ExecPlan, PlanDispatcher, QueryResponse};
use rand::Rng;

use crate::{
    errors::{Error, Result},
    shardmap::ShardMap,
};

/// A dispatcher bound to a shard's coordinator. Shipping the plan over the
/// wire is the actor/RPC transport's job; this type only carries the
/// endpoint identity the planner resolved.
#[derive(Debug, Clone)]
pub struct ActorPlanDispatcher {
    coord: String,
}

impl ActorPlanDispatcher {
    pub fn new(coord: impl Into<String>) -> Self {
        Self { coord: coord.into() }
    }
}

impl PlanDispatcher for ActorPlanDispatcher {
    fn id(&self) -> &str {
        &self.coord
    }

    fn dispatch(&self, _plan: ExecPlan) -> DispatchFuture {
        // Actual transport is external to this crate (§6.2); the planner
        // only ever constructs this value, it never calls `dispatch`.
        let coord = self.coord.clone();
        Box::pin(async move {
            QueryResponse::Failed {
                error: format!("no transport wired up for coordinator {coord}"),
            }
        })
    }
}

/// `dispatcherForShard` (§4.3): resolves the shard's coordinator and wraps
/// it in an `ActorPlanDispatcher`, or raises `ShardsUnavailable`.
pub fn dispatcher_for_shard(shard: i32, shard_map: &dyn ShardMap) -> Result<Arc<dyn PlanDispatcher>> {
    match shard_map.coord_for_shard(shard) {
        Some(coord) => Ok(Arc::new(ActorPlanDispatcher::new(coord.0))),
        None => Err(Error::ShardsUnavailable(vec![shard])),
    }
}

/// `pickDispatcher` (§4.1): collects the distinct dispatchers among
/// `children` and uniformly picks one at random. Only the membership is a
/// contract; the specific pick is a load-balancing heuristic and callers
/// must not assume it is stable across calls.
pub fn pick_dispatcher(children: &[&ExecPlan]) -> Arc<dyn PlanDispatcher> {
    let mut distinct: Vec<Arc<dyn PlanDispatcher>> = Vec::new();
    for child in children {
        if !distinct.iter().any(|d| d.id() == child.dispatcher.id()) {
            distinct.push(child.dispatcher.clone());
        }
    }
    assert!(!distinct.is_empty(), "pick_dispatcher called with no children");
    let idx = rand::rng().random_range(0..distinct.len());
    distinct[idx].clone()
}
