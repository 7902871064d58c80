//! Typed views over the market data API responses.
//!
//! The wire structs mirror the upstream JSON field-for-field; the public
//! models are what the rest of the crate consumes. Upstream omits fields
//! freely, so every wire field defaults and the mapping fills zeros
//! instead of failing a whole batch.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable price snapshot for one coin.
///
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: Decimal,
    pub change24h_percent: Decimal,
    pub market_cap_usd: Decimal,
    pub image_url: String,
}

/// Single-coin price lookup used by the portfolio engine
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPrice {
    pub price: Decimal,
    pub change24h_percent: Decimal,
    pub name: String,
    pub symbol: String,
    pub image_url: String,
}

/// NFT collection snapshot from `/nfts/{id}`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NftCollection {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image_url: String,
    pub description: String,
    pub floor_price_usd: Decimal,
    pub floor_price_change24h_percent: Decimal,
    pub volume24h_usd: Decimal,
    pub unique_addresses: u64,
    pub unique_addresses_change24h_percent: Decimal,
    pub links: NftLinks,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NftLinks {
    pub homepage: Option<String>,
    pub twitter: Option<String>,
    pub discord: Option<String>,
}

/// Search hit from `/search?query=`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub thumb: String,
}

// ---------------------------------------------------------------------
// Wire models
// ---------------------------------------------------------------------

/// One entry of the `/simple/price` response map
#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct SimplePrice {
    #[serde(default)]
    pub usd: Option<Decimal>,
    #[serde(default)]
    pub usd_24h_change: Option<Decimal>,
    #[serde(default)]
    pub usd_market_cap: Option<Decimal>,
}

pub(crate) type SimplePriceMap = HashMap<String, SimplePrice>;

/// One row of the `/coins/markets` response
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct MarketCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub market_cap: Option<Decimal>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<Decimal>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct UsdValue {
    #[serde(default)]
    pub usd: Option<Decimal>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct NftImageWire {
    #[serde(default)]
    pub small: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct NftLinksWire {
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub discord: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct NftWire {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub image: Option<NftImageWire>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub floor_price: Option<UsdValue>,
    #[serde(default)]
    pub floor_price_in_usd_24h_percentage_change: Option<Decimal>,
    #[serde(default)]
    pub volume_24h: Option<UsdValue>,
    #[serde(default)]
    pub number_of_unique_addresses: Option<u64>,
    #[serde(default)]
    pub number_of_unique_addresses_24h_percentage_change: Option<Decimal>,
    #[serde(default)]
    pub links: Option<NftLinksWire>,
}

impl From<NftWire> for NftCollection {
    fn from(wire: NftWire) -> Self {
        NftCollection {
            id: wire.id,
            name: wire.name,
            symbol: wire.symbol.unwrap_or_default(),
            image_url: wire.image.and_then(|i| i.small).unwrap_or_default(),
            description: wire.description.unwrap_or_default(),
            floor_price_usd: wire
                .floor_price
                .and_then(|v| v.usd)
                .unwrap_or(Decimal::ZERO),
            floor_price_change24h_percent: wire
                .floor_price_in_usd_24h_percentage_change
                .unwrap_or(Decimal::ZERO),
            volume24h_usd: wire.volume_24h.and_then(|v| v.usd).unwrap_or(Decimal::ZERO),
            unique_addresses: wire.number_of_unique_addresses.unwrap_or(0),
            unique_addresses_change24h_percent: wire
                .number_of_unique_addresses_24h_percentage_change
                .unwrap_or(Decimal::ZERO),
            links: wire
                .links
                .map(|l| NftLinks {
                    homepage: l.homepage,
                    twitter: l.twitter,
                    discord: l.discord,
                })
                .unwrap_or_default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct SearchCoinWire {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub thumb: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct SearchWire {
    #[serde(default)]
    pub coins: Vec<SearchCoinWire>,
}
