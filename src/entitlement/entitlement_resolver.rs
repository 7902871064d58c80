//! Merges the two entitlement sources into one fact.
//!
//! The profile document and the approved-orders query update
//! independently and are only eventually consistent with each other.
//! Both raw source states are kept side by side and a pure reducer is
//! re-run on every emission from either one, so a late callback can
//! never clobber the other source's contribution. Until both sources
//! have delivered, the published fact stays non-entitled.

use chrono::{DateTime, Utc};
use log::{error, info};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::entitlement::entitlement_model::EntitlementFact;
use crate::store::{OrderRecord, OrderStatus, ProfileDocument, RemoteStore, SourceState};
use crate::utils::Clock;

/// Priority merge of the two source states.
///
/// A profile that is independently valid wins, carrying its own expiry;
/// otherwise the latest-expiring approved order decides; otherwise the
/// fact is closed. `Pending` and `Failed` sources contribute nothing.
pub fn resolve(
    profile: &SourceState<Option<ProfileDocument>>,
    orders: &SourceState<Vec<OrderRecord>>,
    now: DateTime<Utc>,
) -> EntitlementFact {
    if let SourceState::Ready(Some(document)) = profile {
        if document.is_pro {
            if let Some(expires_at) = document.pro_expires_at {
                if expires_at > now {
                    return EntitlementFact::entitled(expires_at);
                }
            }
        }
    }

    if let SourceState::Ready(records) = orders {
        let best = records
            .iter()
            .filter(|record| record.status == OrderStatus::Approved)
            .filter_map(|record| record.expires_at)
            .filter(|expires_at| *expires_at > now)
            .max();
        if let Some(expires_at) = best {
            return EntitlementFact::entitled(expires_at);
        }
    }

    EntitlementFact::not_entitled()
}

/// Owns both subscriptions for one account and republishes the merged
/// fact whenever either delivers.
///
/// Dropping (or stopping) the resolver tears both subscriptions down
/// together; there is no way to cancel only one.
pub struct EntitlementResolver {
    fact_rx: watch::Receiver<EntitlementFact>,
    task: JoinHandle<()>,
}

impl EntitlementResolver {
    pub fn start(
        store: &dyn RemoteStore,
        account_id: &str,
        email: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut profile_rx = store.watch_profile(account_id);
        let mut orders_rx = store.watch_approved_orders(email);
        let (fact_tx, fact_rx) = watch::channel(EntitlementFact::not_entitled());
        let account = account_id.to_string();

        let task = tokio::spawn(async move {
            loop {
                let fact = {
                    let profile = profile_rx.borrow_and_update().clone();
                    let orders = orders_rx.borrow_and_update().clone();
                    if let SourceState::Failed(message) = &profile {
                        error!("profile subscription error for {account}: {message}");
                    }
                    if let SourceState::Failed(message) = &orders {
                        error!("orders subscription error for {account}: {message}");
                    }
                    resolve(&profile, &orders, clock.now())
                };
                fact_tx.send_replace(fact);

                tokio::select! {
                    changed = profile_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = orders_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            info!("entitlement resolver for {account} stopped");
        });

        Self { fact_rx, task }
    }

    /// Current fact as last published
    pub fn fact(&self) -> EntitlementFact {
        self.fact_rx.borrow().clone()
    }

    /// Subscribe to fact updates
    pub fn subscribe(&self) -> watch::Receiver<EntitlementFact> {
        self.fact_rx.clone()
    }

    /// Cancel both subscriptions together
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for EntitlementResolver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
