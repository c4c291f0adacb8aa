pub mod dataset;
pub mod dispatcher;
pub mod errors;
pub mod materialize;
pub mod options;
pub mod resolver;
pub mod shardmap;

pub use dataset::Dataset;
pub use dispatcher::{dispatcher_for_shard, pick_dispatcher, ActorPlanDispatcher};
pub use errors::{Error, Result};
pub use materialize::Planner;
pub use options::QueryOptions;
pub use resolver::shards_from_filters;
pub use shardmap::{CoordinatorEndpoint, ShardMap, StaticShardMap};
