//! Portfolio synchronization engine.
//!
//! Three loops share one in-memory holdings list: the remote
//! subscription replaces it wholesale on every snapshot, local
//! mutations schedule a debounced write-back, and a periodic refresh
//! pulls fresh prices for every held coin. The local list is the single
//! source of truth between snapshots; a write-back and an incoming
//! snapshot may interleave and the last completed one wins, which is
//! acceptable for a single writer per account.
//!
//! Write-back is suppressed until the first remote snapshot has been
//! applied, so a freshly mounted engine can never overwrite a remote
//! document with its empty default list.

use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::constants::{
    PRICE_REFRESH_INITIAL_DELAY_SECS, PRICE_REFRESH_INTERVAL_SECS, WRITE_DEBOUNCE_MS,
};
use crate::errors::{Error, Result};
use crate::limits::PlanGate;
use crate::market_data::QuoteProvider;
use crate::portfolio::holdings_model::{
    apply_prices, summarize, upsert_holding, Holding, PortfolioSummary,
};
use crate::store::{PortfolioDocument, RemoteStore, SourceState};
use crate::utils::{normalize_coin_id, Clock};

/// Debounce progression for the write-back path
enum DebounceState {
    Idle,
    Pending { deadline: Instant },
}

struct EngineInner {
    account_id: String,
    store: Arc<dyn RemoteStore>,
    quotes: Arc<dyn QuoteProvider>,
    gate: PlanGate,
    clock: Arc<dyn Clock>,
    holdings: RwLock<Vec<Holding>>,
    /// First remote snapshot applied; write-back stays suppressed until then
    loaded: AtomicBool,
}

pub struct PortfolioSyncEngine {
    inner: Arc<EngineInner>,
    dirty_tx: mpsc::UnboundedSender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl PortfolioSyncEngine {
    pub fn start(
        account_id: &str,
        store: Arc<dyn RemoteStore>,
        quotes: Arc<dyn QuoteProvider>,
        gate: PlanGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let portfolio_rx = store.watch_portfolio(account_id);
        let (dirty_tx, dirty_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(EngineInner {
            account_id: account_id.to_string(),
            store,
            quotes,
            gate,
            clock,
            holdings: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
        });

        let tasks = vec![
            tokio::spawn(subscription_loop(inner.clone(), portfolio_rx)),
            tokio::spawn(write_back_loop(inner.clone(), dirty_rx)),
            tokio::spawn(price_refresh_loop(inner.clone(), dirty_tx.clone())),
        ];

        info!("portfolio sync engine started for {account_id}");
        Self {
            inner,
            dirty_tx,
            tasks,
        }
    }

    /// Add a coin, merging into an existing holding for the same id.
    ///
    /// New rows are gate-checked against the plan limit; merging into a
    /// held coin always goes through. The purchase price defaults to
    /// the current price at add time.
    pub async fn add_holding(
        &self,
        coin_id: &str,
        quantity: Decimal,
        purchase_price: Option<Decimal>,
    ) -> Result<Holding> {
        if quantity <= Decimal::ZERO {
            return Err(Error::Validation("quantity must be positive".to_string()));
        }
        if matches!(purchase_price, Some(p) if p <= Decimal::ZERO) {
            return Err(Error::Validation(
                "purchase price must be positive".to_string(),
            ));
        }

        let id = normalize_coin_id(coin_id);
        {
            let holdings = self.inner.holdings.read().unwrap();
            let already_held = holdings.iter().any(|h| h.id == id);
            if !already_held && !self.inner.gate.can_add_holding(holdings.len()) {
                return Err(Error::LimitReached(
                    "free plan holding limit reached".to_string(),
                ));
            }
        }

        let price = self.inner.quotes.portfolio_price(&id).await?;
        let incoming = Holding {
            id: id.clone(),
            name: price.name,
            symbol: price.symbol,
            image_url: price.image_url,
            quantity,
            purchase_price: purchase_price.unwrap_or(price.price),
            current_price: price.price,
            change24h_percent: price.change24h_percent,
        };

        let stored = {
            let mut holdings = self.inner.holdings.write().unwrap();
            upsert_holding(&mut holdings, incoming.clone());
            holdings
                .iter()
                .find(|h| h.id == id)
                .cloned()
                .unwrap_or(incoming)
        };
        self.mark_dirty();
        Ok(stored)
    }

    /// Replace the quantity and purchase price of a held coin
    pub fn update_holding(
        &self,
        coin_id: &str,
        quantity: Decimal,
        purchase_price: Decimal,
    ) -> Result<Holding> {
        if quantity <= Decimal::ZERO || purchase_price <= Decimal::ZERO {
            return Err(Error::Validation(
                "quantity and purchase price must be positive".to_string(),
            ));
        }

        let id = normalize_coin_id(coin_id);
        let updated = {
            let mut holdings = self.inner.holdings.write().unwrap();
            let holding = holdings
                .iter_mut()
                .find(|h| h.id == id)
                .ok_or_else(|| Error::NotFound(id.clone()))?;
            holding.quantity = quantity;
            holding.purchase_price = purchase_price;
            holding.clone()
        };
        self.mark_dirty();
        Ok(updated)
    }

    /// Remove a holding by coin id
    pub fn remove_holding(&self, coin_id: &str) -> Result<()> {
        let id = normalize_coin_id(coin_id);
        {
            let mut holdings = self.inner.holdings.write().unwrap();
            let before = holdings.len();
            holdings.retain(|h| h.id != id);
            if holdings.len() == before {
                return Err(Error::NotFound(id));
            }
        }
        self.mark_dirty();
        Ok(())
    }

    pub fn holdings(&self) -> Vec<Holding> {
        self.inner.holdings.read().unwrap().clone()
    }

    pub fn summary(&self) -> PortfolioSummary {
        summarize(&self.inner.holdings.read().unwrap())
    }

    /// Whether the first remote snapshot has been applied
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::SeqCst)
    }

    /// Cancel the subscription, the pending debounce and the refresh
    /// loop together
    pub fn stop(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }

    fn mark_dirty(&self) {
        let _ = self.dirty_tx.send(());
    }
}

impl Drop for PortfolioSyncEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Applies every remote snapshot over the local list.
///
/// The remote document is authoritative: the whole list is replaced,
/// an absent document reads as empty. Applying a snapshot never
/// schedules a write-back.
async fn subscription_loop(
    inner: Arc<EngineInner>,
    mut portfolio_rx: watch::Receiver<SourceState<Option<PortfolioDocument>>>,
) {
    loop {
        let state = portfolio_rx.borrow_and_update().clone();
        match state {
            SourceState::Pending => {}
            SourceState::Ready(document) => {
                let holdings = document.map(|d| d.holdings).unwrap_or_default();
                *inner.holdings.write().unwrap() = holdings;
                inner.loaded.store(true, Ordering::SeqCst);
            }
            SourceState::Failed(message) => {
                error!(
                    "portfolio subscription error for {}: {message}",
                    inner.account_id
                );
            }
        }

        if portfolio_rx.changed().await.is_err() {
            break;
        }
    }
}

/// Coalesces bursts of local changes into one remote write
async fn write_back_loop(inner: Arc<EngineInner>, mut dirty_rx: mpsc::UnboundedReceiver<()>) {
    let quiet = Duration::from_millis(WRITE_DEBOUNCE_MS);
    let mut state = DebounceState::Idle;

    loop {
        match state {
            DebounceState::Idle => match dirty_rx.recv().await {
                Some(()) => {
                    state = DebounceState::Pending {
                        deadline: Instant::now() + quiet,
                    };
                }
                None => break,
            },
            DebounceState::Pending { deadline } => {
                tokio::select! {
                    signal = dirty_rx.recv() => match signal {
                        Some(()) => {
                            // re-arm: a fresh change restarts the quiet period
                            state = DebounceState::Pending {
                                deadline: Instant::now() + quiet,
                            };
                        }
                        None => {
                            flush(&inner).await;
                            break;
                        }
                    },
                    _ = tokio::time::sleep_until(deadline) => {
                        flush(&inner).await;
                        state = DebounceState::Idle;
                    }
                }
            }
        }
    }
}

async fn flush(inner: &EngineInner) {
    if !inner.loaded.load(Ordering::SeqCst) {
        debug!(
            "write-back suppressed for {}: initial load not complete",
            inner.account_id
        );
        return;
    }

    let document = PortfolioDocument {
        holdings: inner.holdings.read().unwrap().clone(),
        updated_at: inner.clock.now(),
    };
    if let Err(err) = inner.store.save_portfolio(&inner.account_id, &document).await {
        error!("portfolio write-back failed for {}: {err}", inner.account_id);
    }
}

/// Refreshes prices for every held coin on a fixed cadence
async fn price_refresh_loop(inner: Arc<EngineInner>, dirty_tx: mpsc::UnboundedSender<()>) {
    tokio::time::sleep(Duration::from_secs(PRICE_REFRESH_INITIAL_DELAY_SECS)).await;

    let mut tick = tokio::time::interval(Duration::from_secs(PRICE_REFRESH_INTERVAL_SECS));
    loop {
        tick.tick().await;
        refresh_prices(&inner, &dirty_tx).await;
    }
}

async fn refresh_prices(inner: &EngineInner, dirty_tx: &mpsc::UnboundedSender<()>) {
    let ids: Vec<String> = inner
        .holdings
        .read()
        .unwrap()
        .iter()
        .map(|h| h.id.clone())
        .collect();
    if ids.is_empty() {
        return;
    }

    let fetches = ids.iter().map(|id| inner.quotes.portfolio_price(id));
    let results = futures::future::join_all(fetches).await;

    let mut prices = HashMap::new();
    for (id, result) in ids.into_iter().zip(results) {
        match result {
            Ok(price) => {
                prices.insert(id, price);
            }
            // per-item failure: keep the previous price for this holding
            Err(err) => warn!("price refresh failed for {id}: {err}"),
        }
    }
    if prices.is_empty() {
        return;
    }

    let changed = {
        let mut holdings = inner.holdings.write().unwrap();
        apply_prices(&mut holdings, &prices)
    };
    if changed {
        let _ = dirty_tx.send(());
    } else {
        debug!("price refresh changed nothing, skipping write-back");
    }
}
