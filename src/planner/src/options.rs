#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    /// log2 of the number of shard buckets one query may fan out to.
    pub shard_key_spread: i32,
    /// Used only when the dataset declares no shard-key columns.
    pub shard_overrides: Option<Vec<i32>>,
    /// Upper bound on range vectors a leaf node may lazily produce.
    pub item_limit: usize,
}
