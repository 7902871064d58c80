//! The derived entitlement fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MS_PER_DAY: i64 = 86_400_000;

/// Whether the account is entitled to premium features, and until when.
///
/// Derived from the two remote sources, never persisted by the core;
/// the default is the fail-closed non-entitled state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementFact {
    pub is_pro: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl EntitlementFact {
    pub fn entitled(expires_at: DateTime<Utc>) -> Self {
        Self {
            is_pro: true,
            expires_at: Some(expires_at),
        }
    }

    pub fn not_entitled() -> Self {
        Self::default()
    }

    /// The fact as of `now`: an expired entitlement collapses to
    /// non-entitled. Published facts are not refreshed on a timer, so
    /// consumers apply this at the point of use.
    pub fn effective(&self, now: DateTime<Utc>) -> EntitlementFact {
        match self.expires_at {
            Some(expires_at) if self.is_pro && expires_at > now => self.clone(),
            _ => EntitlementFact::not_entitled(),
        }
    }

    /// Whole days until expiry, rounded up and clamped to zero.
    /// `None` when there is no expiry to count down from.
    pub fn remaining_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|expires_at| {
            let ms = (expires_at - now).num_milliseconds();
            if ms <= 0 {
                0
            } else {
                (ms + MS_PER_DAY - 1) / MS_PER_DAY
            }
        })
    }
}
