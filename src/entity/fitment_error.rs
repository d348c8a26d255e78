use thiserror::Error;

/// Failure of a catalog load. Any variant aborts the whole sweep.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("storefront request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("storefront returned {0}")]
    Status(String),
    #[error("storefront query failed: {0}")]
    Query(String),
    #[error("unexpected storefront response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("local storage holds malformed json: {0}")]
    Json(#[from] serde_json::Error),
}
