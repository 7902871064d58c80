//! Documents the core reads from and writes to the remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portfolio::Holding;

/// Per-account profile document.
///
/// One of the two independently-updating sources of the entitlement
/// fact; also carries the plan bookkeeping fields the back office edits.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    #[serde(default)]
    pub is_pro: bool,
    #[serde(default)]
    pub pro_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub plan_limit: Option<u32>,
    #[serde(default)]
    pub usage_count: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
}

/// One record of the `orders` collection
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub email: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Per-account portfolio document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDocument {
    pub holdings: Vec<Holding>,
    pub updated_at: DateTime<Utc>,
}
