//! Plan limit gate.
//!
//! The entitlement fact decides whether new holdings and alerts may be
//! created; free accounts get a small fixed allowance. The gate only
//! governs the creation of new entries - merges, edits, deletes and the
//! price/alert data flow are never gated.

use std::sync::Arc;
use tokio::sync::watch;

use crate::constants::{FREE_PLAN_MAX_ALERTS, FREE_PLAN_MAX_HOLDINGS};
use crate::entitlement::EntitlementFact;
use crate::utils::Clock;

#[derive(Clone)]
pub struct PlanGate {
    entitlement: watch::Receiver<EntitlementFact>,
    clock: Arc<dyn Clock>,
}

impl PlanGate {
    pub fn new(entitlement: watch::Receiver<EntitlementFact>, clock: Arc<dyn Clock>) -> Self {
        Self { entitlement, clock }
    }

    /// Entitled as of now; a stale published fact with a lapsed expiry
    /// reads as free
    pub fn is_pro(&self) -> bool {
        self.entitlement.borrow().effective(self.clock.now()).is_pro
    }

    pub fn can_add_holding(&self, current_holdings: usize) -> bool {
        self.is_pro() || current_holdings < FREE_PLAN_MAX_HOLDINGS
    }

    pub fn can_add_alert(&self, active_alerts: usize) -> bool {
        self.is_pro() || active_alerts < FREE_PLAN_MAX_ALERTS
    }
}
