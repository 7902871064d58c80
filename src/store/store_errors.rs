use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Failed to serialize document: {0}")]
    Serialization(#[from] serde_json::Error),
}
