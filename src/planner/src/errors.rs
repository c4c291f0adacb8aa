#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("bad query: {0}")]
    BadQuery(String),

    #[error("shards unavailable: {0:?}")]
    ShardsUnavailable(Vec<i32>),
}

pub type Result<T> = std::result::Result<T, Error>;
