//! Holdings and the pure list operations the sync engine runs on them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::market_data::PortfolioPrice;

/// One position in the portfolio.
///
/// At most one holding per coin id exists in a list; adds merge into
/// the existing row instead of duplicating it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image_url: String,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub current_price: Decimal,
    pub change24h_percent: Decimal,
}

/// Aggregates over a holdings list, computed on demand and never stored
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub gain: Decimal,
    pub gain_pct: Decimal,
}

/// Merge a holding into the list.
///
/// An existing row with the same id absorbs the quantity and takes the
/// freshly fetched price fields; its purchase price is left alone.
/// Returns whether a merge happened.
pub fn upsert_holding(holdings: &mut Vec<Holding>, incoming: Holding) -> bool {
    if let Some(existing) = holdings.iter_mut().find(|h| h.id == incoming.id) {
        existing.quantity += incoming.quantity;
        existing.current_price = incoming.current_price;
        existing.change24h_percent = incoming.change24h_percent;
        true
    } else {
        holdings.push(incoming);
        false
    }
}

/// Apply refreshed prices in place.
///
/// Holdings without an entry in `prices` keep their previous values.
/// Returns whether any field actually changed, so callers can skip the
/// write-back cycle on a no-op refresh.
pub fn apply_prices(holdings: &mut [Holding], prices: &HashMap<String, PortfolioPrice>) -> bool {
    let mut changed = false;
    for holding in holdings.iter_mut() {
        if let Some(price) = prices.get(&holding.id) {
            if holding.current_price != price.price
                || holding.change24h_percent != price.change24h_percent
            {
                holding.current_price = price.price;
                holding.change24h_percent = price.change24h_percent;
                changed = true;
            }
        }
    }
    changed
}

/// Compute the derived aggregates for a holdings list
pub fn summarize(holdings: &[Holding]) -> PortfolioSummary {
    let total_value: Decimal = holdings
        .iter()
        .map(|h| h.current_price * h.quantity)
        .sum();
    let total_cost: Decimal = holdings
        .iter()
        .map(|h| h.purchase_price * h.quantity)
        .sum();
    let gain = total_value - total_cost;
    let gain_pct = if total_cost.is_zero() {
        Decimal::ZERO
    } else {
        gain / total_cost * Decimal::ONE_HUNDRED
    };

    PortfolioSummary {
        total_value,
        total_cost,
        gain,
        gain_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn holding(id: &str, quantity: Decimal, purchase: Decimal, current: Decimal) -> Holding {
        Holding {
            id: id.to_string(),
            name: id.to_string(),
            symbol: id[..3.min(id.len())].to_string(),
            image_url: String::new(),
            quantity,
            purchase_price: purchase,
            current_price: current,
            change24h_percent: Decimal::ZERO,
        }
    }

    #[test]
    fn test_upsert_merges_quantity_keeps_purchase_price() {
        let mut holdings = vec![holding("bitcoin", dec!(1), dec!(40000), dec!(50000))];

        let merged = upsert_holding(
            &mut holdings,
            holding("bitcoin", dec!(0.5), dec!(60000), dec!(52000)),
        );

        assert!(merged);
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].quantity, dec!(1.5));
        assert_eq!(holdings[0].purchase_price, dec!(40000));
        assert_eq!(holdings[0].current_price, dec!(52000));
    }

    #[test]
    fn test_upsert_appends_new_id() {
        let mut holdings = vec![holding("bitcoin", dec!(1), dec!(40000), dec!(50000))];
        let merged = upsert_holding(
            &mut holdings,
            holding("ethereum", dec!(2), dec!(3000), dec!(3100)),
        );
        assert!(!merged);
        assert_eq!(holdings.len(), 2);
    }

    #[test]
    fn test_apply_prices_reports_no_change() {
        let mut holdings = vec![holding("bitcoin", dec!(1), dec!(40000), dec!(50000))];
        let mut prices = HashMap::new();
        prices.insert(
            "bitcoin".to_string(),
            PortfolioPrice {
                price: dec!(50000),
                change24h_percent: Decimal::ZERO,
                name: "Bitcoin".to_string(),
                symbol: "btc".to_string(),
                image_url: String::new(),
            },
        );

        assert!(!apply_prices(&mut holdings, &prices));

        prices.get_mut("bitcoin").unwrap().price = dec!(51000);
        assert!(apply_prices(&mut holdings, &prices));
        assert_eq!(holdings[0].current_price, dec!(51000));
    }

    #[test]
    fn test_summarize() {
        let holdings = vec![
            holding("bitcoin", dec!(2), dec!(40000), dec!(50000)),
            holding("ethereum", dec!(10), dec!(3000), dec!(2500)),
        ];
        let summary = summarize(&holdings);

        assert_eq!(summary.total_value, dec!(125000));
        assert_eq!(summary.total_cost, dec!(110000));
        assert_eq!(summary.gain, dec!(15000));
        assert!(summary.gain_pct > dec!(13.6) && summary.gain_pct < dec!(13.7));
    }

    #[test]
    fn test_summarize_zero_cost_has_zero_pct() {
        let holdings = vec![holding("airdrop", dec!(100), dec!(0), dec!(2))];
        let summary = summarize(&holdings);
        assert_eq!(summary.total_value, dec!(200));
        assert_eq!(summary.gain_pct, Decimal::ZERO);
    }
}
