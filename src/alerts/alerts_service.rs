//! Alert bookkeeping and the evaluation loop.
//!
//! The alert list lives in browser-local storage and is reloaded on
//! construction. A single evaluation task fetches quotes for every
//! active alert's coin on a fixed cadence and dispatches at most one
//! notification per alert: a successful dispatch deactivates the alert
//! before anything else can fire it again, a failed dispatch leaves it
//! active for the next cycle.

use async_trait::async_trait;
use log::{info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::alerts::alerts_errors::AlertError;
use crate::alerts::alerts_model::{AlertDirection, PriceAlert};
use crate::constants::ALERT_EVAL_INTERVAL_SECS;
use crate::errors::{Error, Result};
use crate::limits::PlanGate;
use crate::market_data::QuoteProvider;
use crate::store::LocalStore;
use crate::utils::{normalize_coin_id, Clock};

/// Outbound notification channel (email relay, push bridge, ...)
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, alert: &PriceAlert, price: Decimal) -> std::result::Result<(), AlertError>;
}

struct ServiceInner {
    storage_key: String,
    local: Arc<dyn LocalStore>,
    quotes: Arc<dyn QuoteProvider>,
    notifier: Arc<dyn AlertNotifier>,
    gate: PlanGate,
    clock: Arc<dyn Clock>,
    alerts: RwLock<Vec<PriceAlert>>,
}

impl ServiceInner {
    fn persist(&self) -> Result<()> {
        let payload = serde_json::to_string(&*self.alerts.read().unwrap())
            .map_err(crate::store::StoreError::from)?;
        self.local.set(&self.storage_key, &payload)?;
        Ok(())
    }
}

pub struct AlertService {
    inner: Arc<ServiceInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AlertService {
    pub fn new(
        account_id: &str,
        local: Arc<dyn LocalStore>,
        quotes: Arc<dyn QuoteProvider>,
        notifier: Arc<dyn AlertNotifier>,
        gate: PlanGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let storage_key = format!("cryptoflash-alerts-{account_id}");
        let alerts = match local.get(&storage_key) {
            Ok(Some(payload)) => serde_json::from_str(&payload).unwrap_or_else(|err| {
                warn!("discarding unreadable alert list under {storage_key}: {err}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("could not read alert list under {storage_key}: {err}");
                Vec::new()
            }
        };

        Self {
            inner: Arc::new(ServiceInner {
                storage_key,
                local,
                quotes,
                notifier,
                gate,
                clock,
                alerts: RwLock::new(alerts),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn alerts(&self) -> Vec<PriceAlert> {
        self.inner.alerts.read().unwrap().clone()
    }

    pub fn add_alert(
        &self,
        coin_id: &str,
        coin_name: &str,
        coin_symbol: &str,
        target_price: Decimal,
        direction: AlertDirection,
        notify_address: &str,
    ) -> Result<PriceAlert> {
        if target_price <= Decimal::ZERO {
            return Err(Error::Validation("target price must be positive".to_string()));
        }
        if notify_address.trim().is_empty() {
            return Err(Error::Validation("notify address must not be empty".to_string()));
        }

        let alert = {
            let mut alerts = self.inner.alerts.write().unwrap();
            let active = alerts.iter().filter(|a| a.is_active).count();
            if !self.inner.gate.can_add_alert(active) {
                return Err(Error::LimitReached(
                    "free plan alert limit reached".to_string(),
                ));
            }

            let alert = PriceAlert {
                id: Uuid::new_v4().to_string(),
                coin_id: normalize_coin_id(coin_id),
                coin_name: coin_name.to_string(),
                coin_symbol: coin_symbol.to_string(),
                target_price,
                direction,
                notify_address: notify_address.trim().to_string(),
                created_at: self.inner.clock.now(),
                is_active: true,
            };
            alerts.push(alert.clone());
            alert
        };
        if let Err(err) = self.inner.persist() {
            // keep memory and storage in step: an unpersisted alert is
            // rolled back instead of living only until the next reload
            let mut alerts = self.inner.alerts.write().unwrap();
            alerts.retain(|a| a.id != alert.id);
            return Err(err);
        }
        Ok(alert)
    }

    pub fn remove_alert(&self, alert_id: &str) -> Result<()> {
        {
            let mut alerts = self.inner.alerts.write().unwrap();
            let before = alerts.len();
            alerts.retain(|a| a.id != alert_id);
            if alerts.len() == before {
                return Err(Error::NotFound(alert_id.to_string()));
            }
        }
        self.inner.persist()
    }

    /// Run one evaluation pass over the active alerts.
    ///
    /// A quote fetch failure skips the whole cycle; nothing is
    /// dispatched or deactivated on stale data.
    pub async fn evaluate(&self) {
        evaluate_cycle(&self.inner).await;
    }

    /// Spawn the periodic evaluation task. Idempotent per service.
    pub fn start_evaluation(&self) {
        let mut slot = self.task.lock().unwrap();
        if slot.is_some() {
            return;
        }
        let inner = self.inner.clone();
        *slot = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(ALERT_EVAL_INTERVAL_SECS));
            loop {
                tick.tick().await;
                evaluate_cycle(&inner).await;
            }
        }));
        info!("alert evaluation loop started");
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl Drop for AlertService {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn evaluate_cycle(inner: &ServiceInner) {
    let active: Vec<PriceAlert> = inner
        .alerts
        .read()
        .unwrap()
        .iter()
        .filter(|a| a.is_active)
        .cloned()
        .collect();
    if active.is_empty() {
        return;
    }

    let mut ids: Vec<String> = active.iter().map(|a| a.coin_id.clone()).collect();
    ids.sort();
    ids.dedup();

    let quotes = match inner.quotes.quotes(&ids).await {
        Ok(quotes) => quotes,
        Err(err) => {
            warn!("alert evaluation skipped, quote fetch failed: {err}");
            return;
        }
    };
    let prices: HashMap<String, Decimal> =
        quotes.into_iter().map(|q| (q.id, q.price)).collect();

    let mut dispatched = Vec::new();
    for alert in &active {
        let Some(price) = prices.get(&alert.coin_id) else {
            continue;
        };
        if !alert.is_triggered(*price) {
            continue;
        }
        match inner.notifier.notify(alert, *price).await {
            Ok(()) => {
                info!(
                    "alert {} fired for {} at {price}",
                    alert.id, alert.coin_id
                );
                dispatched.push(alert.id.clone());
            }
            Err(err) => {
                warn!(
                    "alert {} dispatch failed, will retry next cycle: {err}",
                    alert.id
                );
            }
        }
    }
    if dispatched.is_empty() {
        return;
    }

    {
        let mut alerts = inner.alerts.write().unwrap();
        for alert in alerts.iter_mut() {
            if dispatched.contains(&alert.id) {
                alert.is_active = false;
            }
        }
    }
    if let Err(err) = inner.persist() {
        warn!("could not persist alert list after dispatch: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dashmap::DashMap;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::watch;

    use crate::entitlement::EntitlementFact;
    use crate::market_data::{MarketDataError, PortfolioPrice, Quote};
    use crate::store::MemoryLocalStore;
    use crate::utils::SystemClock;

    struct TableQuotes {
        prices: DashMap<String, Decimal>,
        failing: AtomicBool,
    }

    impl TableQuotes {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                prices: DashMap::new(),
                failing: AtomicBool::new(false),
            })
        }

        fn set_price(&self, id: &str, price: Decimal) {
            self.prices.insert(id.to_string(), price);
        }
    }

    #[async_trait]
    impl QuoteProvider for TableQuotes {
        async fn quotes(&self, ids: &[String]) -> std::result::Result<Vec<Quote>, MarketDataError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(MarketDataError::Http {
                    status: 503,
                    message: "mock outage".to_string(),
                });
            }
            Ok(ids
                .iter()
                .filter_map(|id| {
                    self.prices.get(id).map(|price| Quote {
                        id: id.clone(),
                        name: id.clone(),
                        symbol: id[..3.min(id.len())].to_string(),
                        price: *price,
                        change24h_percent: Decimal::ZERO,
                        market_cap_usd: Decimal::ZERO,
                        image_url: String::new(),
                    })
                })
                .collect())
        }

        async fn portfolio_price(
            &self,
            coin_id: &str,
        ) -> std::result::Result<PortfolioPrice, MarketDataError> {
            let price = self.prices.get(coin_id).ok_or(MarketDataError::Http {
                status: 404,
                message: "unknown coin".to_string(),
            })?;
            Ok(PortfolioPrice {
                price: *price,
                change24h_percent: Decimal::ZERO,
                name: coin_id.to_string(),
                symbol: coin_id[..3.min(coin_id.len())].to_string(),
                image_url: String::new(),
            })
        }
    }

    struct RecordingNotifier {
        sent: Mutex<Vec<(String, Decimal)>>,
        failing: AtomicBool,
    }

    impl RecordingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                failing: AtomicBool::new(false),
            })
        }

        fn sent(&self) -> Vec<(String, Decimal)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AlertNotifier for RecordingNotifier {
        async fn notify(
            &self,
            alert: &PriceAlert,
            price: Decimal,
        ) -> std::result::Result<(), AlertError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AlertError::DispatchFailed("relay unavailable".to_string()));
            }
            self.sent.lock().unwrap().push((alert.coin_id.clone(), price));
            Ok(())
        }
    }

    struct BrokenLocalStore;

    impl crate::store::LocalStore for BrokenLocalStore {
        fn get(&self, _key: &str) -> std::result::Result<Option<String>, crate::store::StoreError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), crate::store::StoreError> {
            Err(crate::store::StoreError::Backend(
                "storage unavailable".to_string(),
            ))
        }

        fn remove(&self, _key: &str) -> std::result::Result<(), crate::store::StoreError> {
            Ok(())
        }
    }

    fn gate(fact: EntitlementFact) -> PlanGate {
        let (tx, rx) = watch::channel(fact);
        std::mem::forget(tx);
        PlanGate::new(rx, Arc::new(SystemClock))
    }

    fn pro_gate() -> PlanGate {
        gate(EntitlementFact::entitled(
            Utc::now() + chrono::Duration::days(365),
        ))
    }

    fn service(
        local: Arc<MemoryLocalStore>,
        quotes: Arc<TableQuotes>,
        notifier: Arc<RecordingNotifier>,
        gate: PlanGate,
    ) -> AlertService {
        AlertService::new(
            "acct",
            local,
            quotes,
            notifier,
            gate,
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn test_alert_fires_at_most_once() {
        let quotes = TableQuotes::new();
        let notifier = RecordingNotifier::new();
        let svc = service(
            Arc::new(MemoryLocalStore::new()),
            quotes.clone(),
            notifier.clone(),
            pro_gate(),
        );
        svc.add_alert(
            "bitcoin",
            "Bitcoin",
            "btc",
            dec!(100),
            AlertDirection::Above,
            "me@example.com",
        )
        .unwrap();

        for price in [dec!(90), dec!(101), dec!(102)] {
            quotes.set_price("bitcoin", price);
            svc.evaluate().await;
        }

        assert_eq!(notifier.sent(), vec![("bitcoin".to_string(), dec!(101))]);
        assert!(!svc.alerts()[0].is_active);
    }

    #[tokio::test]
    async fn test_failed_dispatch_retries_next_cycle() {
        let quotes = TableQuotes::new();
        let notifier = RecordingNotifier::new();
        let svc = service(
            Arc::new(MemoryLocalStore::new()),
            quotes.clone(),
            notifier.clone(),
            pro_gate(),
        );
        svc.add_alert(
            "bitcoin",
            "Bitcoin",
            "btc",
            dec!(100),
            AlertDirection::Above,
            "me@example.com",
        )
        .unwrap();
        quotes.set_price("bitcoin", dec!(110));

        notifier.failing.store(true, Ordering::SeqCst);
        svc.evaluate().await;
        assert!(notifier.sent().is_empty());
        assert!(svc.alerts()[0].is_active);

        notifier.failing.store(false, Ordering::SeqCst);
        svc.evaluate().await;
        assert_eq!(notifier.sent().len(), 1);
        assert!(!svc.alerts()[0].is_active);
    }

    #[tokio::test]
    async fn test_quote_outage_skips_cycle() {
        let quotes = TableQuotes::new();
        let notifier = RecordingNotifier::new();
        let svc = service(
            Arc::new(MemoryLocalStore::new()),
            quotes.clone(),
            notifier.clone(),
            pro_gate(),
        );
        svc.add_alert(
            "bitcoin",
            "Bitcoin",
            "btc",
            dec!(100),
            AlertDirection::Above,
            "me@example.com",
        )
        .unwrap();
        quotes.set_price("bitcoin", dec!(110));
        quotes.failing.store(true, Ordering::SeqCst);

        svc.evaluate().await;
        assert!(notifier.sent().is_empty());
        assert!(svc.alerts()[0].is_active);
    }

    #[tokio::test]
    async fn test_free_plan_alert_limit_counts_active_only() {
        let quotes = TableQuotes::new();
        let notifier = RecordingNotifier::new();
        let svc = service(
            Arc::new(MemoryLocalStore::new()),
            quotes.clone(),
            notifier.clone(),
            gate(EntitlementFact::not_entitled()),
        );

        svc.add_alert("a", "A", "a", dec!(1), AlertDirection::Above, "x@y.z")
            .unwrap();
        svc.add_alert("b", "B", "b", dec!(1), AlertDirection::Above, "x@y.z")
            .unwrap();
        let err = svc
            .add_alert("c", "C", "c", dec!(1), AlertDirection::Above, "x@y.z")
            .unwrap_err();
        assert!(matches!(err, Error::LimitReached(_)));

        // a fired alert frees its slot
        quotes.set_price("a", dec!(2));
        svc.evaluate().await;
        svc.add_alert("c", "C", "c", dec!(1), AlertDirection::Above, "x@y.z")
            .unwrap();
    }

    #[tokio::test]
    async fn test_alert_list_survives_restart() {
        let local = Arc::new(MemoryLocalStore::new());
        let quotes = TableQuotes::new();
        let notifier = RecordingNotifier::new();
        {
            let svc = service(local.clone(), quotes.clone(), notifier.clone(), pro_gate());
            svc.add_alert(
                "Bitcoin",
                "Bitcoin",
                "btc",
                dec!(100),
                AlertDirection::Below,
                "me@example.com",
            )
            .unwrap();
        }

        let svc = service(local, quotes, notifier, pro_gate());
        let alerts = svc.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].coin_id, "bitcoin");
        assert_eq!(alerts[0].direction, AlertDirection::Below);
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back_new_alert() {
        let svc = AlertService::new(
            "acct",
            Arc::new(BrokenLocalStore),
            TableQuotes::new(),
            RecordingNotifier::new(),
            pro_gate(),
            Arc::new(SystemClock),
        );

        let err = svc
            .add_alert(
                "bitcoin",
                "Bitcoin",
                "btc",
                dec!(100),
                AlertDirection::Above,
                "me@example.com",
            )
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        // the unpersisted alert is not left behind in memory
        assert!(svc.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_persisted_list_starts_empty() {
        let local = Arc::new(MemoryLocalStore::new());
        local.set("cryptoflash-alerts-acct", "not json").unwrap();

        let svc = service(
            local,
            TableQuotes::new(),
            RecordingNotifier::new(),
            pro_gate(),
        );
        assert!(svc.alerts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluation_loop_runs_on_cadence() {
        let quotes = TableQuotes::new();
        let notifier = RecordingNotifier::new();
        let svc = service(
            Arc::new(MemoryLocalStore::new()),
            quotes.clone(),
            notifier.clone(),
            pro_gate(),
        );
        svc.add_alert(
            "bitcoin",
            "Bitcoin",
            "btc",
            dec!(100),
            AlertDirection::Above,
            "me@example.com",
        )
        .unwrap();
        svc.start_evaluation();

        // first tick fires immediately but the price is below target
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(notifier.sent().is_empty());

        quotes.set_price("bitcoin", dec!(150));
        tokio::time::sleep(Duration::from_secs(ALERT_EVAL_INTERVAL_SECS)).await;
        assert_eq!(notifier.sent().len(), 1);
    }
}
