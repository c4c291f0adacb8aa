// The shard-map gossip layer is an external collaborator: only the two
// operations the planner needs are modeled here.

/// Opaque transport address of the node coordinating a shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinatorEndpoint(pub String);

pub trait ShardMap: Send + Sync {
    /// Translates a shard-key hash into the list of shards one query may
    /// fan out to. `spread` is log2 of the max fan-out (spread=3 => up to
    /// 8 shards).
    fn query_shards(&self, shard_hash: i32, spread: i32) -> Vec<i32>;

    /// The coordinator currently owning `shard`, if any is assigned.
    fn coord_for_shard(&self, shard: i32) -> Option<CoordinatorEndpoint>;
}

/// A fixed-table shard map, useful for tests and for small static
/// deployments where shard ownership doesn't change at runtime.
#[derive(Debug, Default)]
pub struct StaticShardMap {
    routes: std::collections::HashMap<i32, Vec<i32>>,
    coords: std::collections::HashMap<i32, CoordinatorEndpoint>,
}

impl StaticShardMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, shard_hash: i32, shards: Vec<i32>) -> Self {
        self.routes.insert(shard_hash, shards);
        self
    }

    pub fn with_coordinator(mut self, shard: i32, coord: impl Into<String>) -> Self {
        self.coords.insert(shard, CoordinatorEndpoint(coord.into()));
        self
    }
}

impl ShardMap for StaticShardMap {
    fn query_shards(&self, shard_hash: i32, _spread: i32) -> Vec<i32> {
        self.routes.get(&shard_hash).cloned().unwrap_or_default()
    }

    fn coord_for_shard(&self, shard: i32) -> Option<CoordinatorEndpoint> {
        self.coords.get(&shard).cloned()
    }
}
