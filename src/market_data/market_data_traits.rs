//! Seam traits for the market data layer.
//!
//! `HttpTransport` isolates the wire so the retry/cache logic is
//! testable without a network; `QuoteProvider` is the narrow surface the
//! portfolio engine and the alert loop consume.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::market_data::market_data_constants::REQUEST_TIMEOUT_SECS;
use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::{PortfolioPrice, Quote};

/// One GET returning parsed JSON
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, MarketDataError>;
}

/// Production transport over `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value, MarketDataError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Quote lookups consumed by the portfolio engine and the alert loop
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Latest quotes for a set of coin ids
    async fn quotes(&self, ids: &[String]) -> Result<Vec<Quote>, MarketDataError>;

    /// Latest price for a single held coin
    async fn portfolio_price(&self, coin_id: &str) -> Result<PortfolioPrice, MarketDataError>;
}
