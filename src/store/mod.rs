//! Boundary to the hosted document store.
//!
//! The store itself is external; the core only relies on the query and
//! real-time subscription primitives defined here. Subscriptions are
//! `tokio::sync::watch` channels carrying a [`SourceState`] so consumers
//! can tell "not delivered yet" apart from "delivered empty" and from a
//! listener error - the entitlement resolver fails closed on the former
//! and falls back on the latter.

pub(crate) mod memory;
pub(crate) mod store_errors;
pub(crate) mod store_model;

pub use memory::{MemoryLocalStore, MemoryRemoteStore};
pub use store_errors::StoreError;
pub use store_model::{OrderRecord, OrderStatus, PortfolioDocument, ProfileDocument};

use async_trait::async_trait;
use tokio::sync::watch;

/// Latest snapshot of one remote subscription
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SourceState<T> {
    /// The subscription has not delivered yet
    #[default]
    Pending,
    /// Latest snapshot from the remote listener
    Ready(T),
    /// The remote listener reported an error
    Failed(String),
}

impl<T> SourceState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            SourceState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Hosted document store, reduced to what the core consumes
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Subscribe to the per-account profile document
    fn watch_profile(
        &self,
        account_id: &str,
    ) -> watch::Receiver<SourceState<Option<ProfileDocument>>>;

    /// Subscribe to the order records for an email, filtered to
    /// `status == approved` by the backing query
    fn watch_approved_orders(&self, email: &str) -> watch::Receiver<SourceState<Vec<OrderRecord>>>;

    /// Subscribe to the per-account portfolio document
    fn watch_portfolio(
        &self,
        account_id: &str,
    ) -> watch::Receiver<SourceState<Option<PortfolioDocument>>>;

    /// Persist the portfolio document for an account
    async fn save_portfolio(
        &self,
        account_id: &str,
        document: &PortfolioDocument,
    ) -> Result<(), StoreError>;
}

/// Browser-local key/value store (alert list, theme preference)
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
