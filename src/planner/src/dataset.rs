/// Schema-administration concerns (column types, retention, etc.) are out
/// of scope; the planner only needs a dataset's name and its declared
/// shard-key columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
    pub shard_key_columns: Vec<String>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, shard_key_columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            shard_key_columns,
        }
    }
}
