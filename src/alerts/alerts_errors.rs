use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    /// The notification channel rejected the dispatch; the alert stays
    /// active and the next evaluation cycle retries it
    #[error("Alert dispatch failed: {0}")]
    DispatchFailed(String),
}
