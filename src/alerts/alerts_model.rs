use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Above,
    Below,
}

/// A one-shot price threshold.
///
/// Alerts deactivate after a successful dispatch; a crossed threshold
/// never fires twice.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub id: String,
    pub coin_id: String,
    pub coin_name: String,
    pub coin_symbol: String,
    pub target_price: Decimal,
    pub direction: AlertDirection,
    pub notify_address: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl PriceAlert {
    /// Whether `price` reaches the threshold in the alert's direction.
    /// A price exactly at the target fires.
    pub fn is_triggered(&self, price: Decimal) -> bool {
        match self.direction {
            AlertDirection::Above => price >= self.target_price,
            AlertDirection::Below => price <= self.target_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn alert(direction: AlertDirection, target: Decimal) -> PriceAlert {
        PriceAlert {
            id: "a1".to_string(),
            coin_id: "bitcoin".to_string(),
            coin_name: "Bitcoin".to_string(),
            coin_symbol: "btc".to_string(),
            target_price: target,
            direction,
            notify_address: "me@example.com".to_string(),
            created_at: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn test_trigger_directions() {
        let above = alert(AlertDirection::Above, dec!(100));
        assert!(!above.is_triggered(dec!(99)));
        assert!(above.is_triggered(dec!(100)));
        assert!(above.is_triggered(dec!(100.01)));

        let below = alert(AlertDirection::Below, dec!(100));
        assert!(below.is_triggered(dec!(99)));
        assert!(below.is_triggered(dec!(100)));
        assert!(!below.is_triggered(dec!(101)));
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AlertDirection::Above).unwrap(),
            "\"above\""
        );
        assert_eq!(
            serde_json::from_str::<AlertDirection>("\"below\"").unwrap(),
            AlertDirection::Below
        );
    }
}
