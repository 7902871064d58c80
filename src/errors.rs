//! Root error types for the CryptoFlash core.
//!
//! Domain-specific errors live next to their modules and are wrapped
//! here so callers can work with a single `Result` alias.

use thiserror::Error;

use crate::alerts::AlertError;
use crate::market_data::MarketDataError;
use crate::store::StoreError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the dashboard core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    #[error("Input validation failed: {0}")]
    Validation(String),

    #[error("Plan limit reached: {0}")]
    LimitReached(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
