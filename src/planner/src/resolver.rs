use logical::ColumnFilter;
use record::hash::shard_key_hash;

use crate::{
    dataset::Dataset,
    errors::{Error, Result},
    options::QueryOptions,
    shardmap::ShardMap,
};

/// `shardsFromFilters` (§4.2): turns a raw series' equality filters into the
/// list of shards that might hold matching partitions.
pub fn shards_from_filters(
    dataset: &Dataset,
    filters: &[ColumnFilter],
    options: &QueryOptions,
    shard_map: &dyn ShardMap,
) -> Result<Vec<i32>> {
    if !dataset.shard_key_columns.is_empty() {
        let mut values = Vec::with_capacity(dataset.shard_key_columns.len());
        for column in &dataset.shard_key_columns {
            let filter = filters.iter().find(|f| &f.column == column).ok_or_else(|| {
                Error::BadQuery(format!("Could not find filter for shard key column {column}"))
            })?;
            let value = filter.filter.as_equals_str().ok_or_else(|| {
                Error::BadQuery(format!(
                    "shard key column {column} must be filtered by string equality"
                ))
            })?;
            values.push(value.to_string());
        }
        let shard_hash = shard_key_hash(&dataset.shard_key_columns, &values);
        Ok(shard_map.query_shards(shard_hash, options.shard_key_spread))
    } else if let Some(overrides) = &options.shard_overrides {
        Ok(overrides.clone())
    } else {
        Err(Error::BadQuery(
            "dataset has no shard-key columns configured and no shard override was supplied"
                .to_string(),
        ))
    }
}
