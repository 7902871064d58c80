//! Caching, retrying client for the public market data API.
//!
//! Every request funnels through [`MarketDataClient::fetch`]: a cache
//! lookup keyed by the full URL, then up to `MAX_RETRIES` extra attempts
//! with a fixed delay for transient failures (5xx and 429). Client-side
//! errors and transport/decode failures surface immediately. The typed
//! operations map the raw JSON into the crate's models, defaulting
//! missing per-coin fields to zero the way the dashboard always has.

use log::warn;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::market_data::market_data_cache::ResponseCache;
use crate::market_data::market_data_constants::{
    API_BASE_URL, MAX_RETRIES, RETRY_DELAY_MS,
};
use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::{
    MarketCoin, NftCollection, NftWire, PortfolioPrice, Quote, SearchResult, SearchWire,
    SimplePriceMap,
};
use crate::market_data::market_data_traits::{HttpTransport, QuoteProvider, ReqwestTransport};
use crate::utils::{Clock, SystemClock};
use rust_decimal::Decimal;

pub struct MarketDataClient {
    transport: Arc<dyn HttpTransport>,
    cache: ResponseCache,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl MarketDataClient {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()), Arc::new(SystemClock))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            cache: ResponseCache::new(clock),
            base_url: API_BASE_URL.to_string(),
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Fetch a URL as raw JSON, serving from cache when fresh.
    ///
    /// Transient failures are retried with a fixed delay; the last error
    /// is surfaced once the budget is spent.
    pub async fn fetch(&self, url: &str) -> Result<Value, MarketDataError> {
        if let Some(cached) = self.cache.get(url) {
            return Ok(cached);
        }

        let mut attempt: u32 = 0;
        loop {
            match self.transport.get_json(url).await {
                Ok(value) => {
                    self.cache.insert(url, value.clone());
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "market data request failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.max_retries + 1,
                        self.retry_delay.as_millis(),
                        err
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Quotes for specific coin ids, merged from `/simple/price` and
    /// `/coins/markets`
    pub async fn fetch_quotes(&self, ids: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        let joined = ids.join(",");
        let price_url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true&include_market_cap=true",
            self.base_url, joined
        );
        let markets_url = format!(
            "{}/coins/markets?vs_currency=usd&ids={}",
            self.base_url, joined
        );

        let prices: SimplePriceMap = serde_json::from_value(self.fetch(&price_url).await?)?;
        let coins: Vec<MarketCoin> = serde_json::from_value(self.fetch(&markets_url).await?)?;

        Ok(coins
            .into_iter()
            .map(|coin| {
                let price = prices.get(&coin.id).cloned().unwrap_or_default();
                Quote {
                    image_url: coin.image.unwrap_or_default(),
                    price: price.usd.unwrap_or(Decimal::ZERO),
                    change24h_percent: price.usd_24h_change.unwrap_or(Decimal::ZERO),
                    market_cap_usd: price.usd_market_cap.unwrap_or(Decimal::ZERO),
                    id: coin.id,
                    name: coin.name,
                    symbol: coin.symbol,
                }
            })
            .collect())
    }

    /// Top coins by market cap
    pub async fn fetch_top_quotes(&self, limit: usize) -> Result<Vec<Quote>, MarketDataError> {
        let url = format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page=1&sparkline=false&price_change_percentage=24h",
            self.base_url, limit
        );
        let coins: Vec<MarketCoin> = serde_json::from_value(self.fetch(&url).await?)?;

        Ok(coins
            .into_iter()
            .map(|coin| Quote {
                image_url: coin.image.unwrap_or_default(),
                price: coin.current_price.unwrap_or(Decimal::ZERO),
                change24h_percent: coin.price_change_percentage_24h.unwrap_or(Decimal::ZERO),
                market_cap_usd: coin.market_cap.unwrap_or(Decimal::ZERO),
                id: coin.id,
                name: coin.name,
                symbol: coin.symbol,
            })
            .collect())
    }

    /// Latest price for a single coin held in a portfolio
    pub async fn fetch_portfolio_price(
        &self,
        coin_id: &str,
    ) -> Result<PortfolioPrice, MarketDataError> {
        let price_url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true",
            self.base_url, coin_id
        );
        let markets_url = format!(
            "{}/coins/markets?vs_currency=usd&ids={}",
            self.base_url, coin_id
        );

        let prices: SimplePriceMap = serde_json::from_value(self.fetch(&price_url).await?)?;
        let coins: Vec<MarketCoin> = serde_json::from_value(self.fetch(&markets_url).await?)?;

        let price = prices.get(coin_id).cloned().unwrap_or_default();
        let coin = coins.into_iter().next();

        Ok(PortfolioPrice {
            price: price.usd.unwrap_or(Decimal::ZERO),
            change24h_percent: price.usd_24h_change.unwrap_or(Decimal::ZERO),
            name: coin
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| coin_id.to_string()),
            symbol: coin
                .as_ref()
                .map(|c| c.symbol.clone())
                .unwrap_or_else(|| coin_id.to_string()),
            image_url: coin.and_then(|c| c.image).unwrap_or_default(),
        })
    }

    /// NFT collection stats from `/nfts/{id}`
    pub async fn fetch_collection(&self, id: &str) -> Result<NftCollection, MarketDataError> {
        let url = format!("{}/nfts/{}", self.base_url, id);
        let wire: NftWire = serde_json::from_value(self.fetch(&url).await?)?;
        Ok(wire.into())
    }

    /// Coin search by free-text query
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let url = format!(
            "{}/search?query={}",
            self.base_url,
            urlencoding::encode(query)
        );
        let wire: SearchWire = serde_json::from_value(self.fetch(&url).await?)?;
        Ok(wire
            .coins
            .into_iter()
            .map(|coin| SearchResult {
                id: coin.id,
                name: coin.name,
                symbol: coin.symbol,
                thumb: coin.thumb.unwrap_or_default(),
            })
            .collect())
    }
}

impl Default for MarketDataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for MarketDataClient {
    async fn quotes(&self, ids: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        self.fetch_quotes(ids).await
    }

    async fn portfolio_price(&self, coin_id: &str) -> Result<PortfolioPrice, MarketDataError> {
        self.fetch_portfolio_price(coin_id).await
    }
}
