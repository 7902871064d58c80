//! In-memory reference backends for the store traits.
//!
//! Used by the test suite and by embedders running without a hosted
//! backend. Subscription channels are created lazily per key; `emit_*`
//! methods stand in for remote listener callbacks. `save_portfolio`
//! records every write and echoes it back through the portfolio
//! subscription, the way a hosted listener re-emits after a write.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;

use crate::store::store_errors::StoreError;
use crate::store::store_model::{OrderRecord, PortfolioDocument, ProfileDocument};
use crate::store::{LocalStore, RemoteStore, SourceState};

type Channel<T> = watch::Sender<SourceState<T>>;

fn subscribe<T: Clone>(map: &DashMap<String, Channel<T>>, key: &str) -> watch::Receiver<SourceState<T>> {
    map.entry(key.to_string())
        .or_insert_with(|| watch::channel(SourceState::Pending).0)
        .subscribe()
}

fn emit<T: Clone>(map: &DashMap<String, Channel<T>>, key: &str, state: SourceState<T>) {
    map.entry(key.to_string())
        .or_insert_with(|| watch::channel(SourceState::Pending).0)
        .send_replace(state);
}

#[derive(Default)]
pub struct MemoryRemoteStore {
    profiles: DashMap<String, Channel<Option<ProfileDocument>>>,
    orders: DashMap<String, Channel<Vec<OrderRecord>>>,
    portfolios: DashMap<String, Channel<Option<PortfolioDocument>>>,
    saved: DashMap<String, Vec<PortfolioDocument>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a profile listener emission
    pub fn emit_profile(&self, account_id: &str, state: SourceState<Option<ProfileDocument>>) {
        emit(&self.profiles, account_id, state);
    }

    /// Simulate an approved-orders listener emission
    pub fn emit_orders(&self, email: &str, state: SourceState<Vec<OrderRecord>>) {
        emit(&self.orders, email, state);
    }

    /// Simulate a portfolio listener emission
    pub fn emit_portfolio(&self, account_id: &str, state: SourceState<Option<PortfolioDocument>>) {
        emit(&self.portfolios, account_id, state);
    }

    /// Every portfolio document written for an account, oldest first
    pub fn saved_portfolios(&self, account_id: &str) -> Vec<PortfolioDocument> {
        self.saved
            .get(account_id)
            .map(|writes| writes.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    fn watch_profile(
        &self,
        account_id: &str,
    ) -> watch::Receiver<SourceState<Option<ProfileDocument>>> {
        subscribe(&self.profiles, account_id)
    }

    fn watch_approved_orders(&self, email: &str) -> watch::Receiver<SourceState<Vec<OrderRecord>>> {
        subscribe(&self.orders, email)
    }

    fn watch_portfolio(
        &self,
        account_id: &str,
    ) -> watch::Receiver<SourceState<Option<PortfolioDocument>>> {
        subscribe(&self.portfolios, account_id)
    }

    async fn save_portfolio(
        &self,
        account_id: &str,
        document: &PortfolioDocument,
    ) -> Result<(), StoreError> {
        self.saved
            .entry(account_id.to_string())
            .or_default()
            .push(document.clone());
        self.emit_portfolio(account_id, SourceState::Ready(Some(document.clone())));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLocalStore {
    values: DashMap<String, String>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).map(|value| value.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}
