//! CryptoFlash Core - client-side consistency and resilience layer.
//!
//! This crate contains the non-presentational core of the CryptoFlash
//! dashboard: a caching/retrying client for a rate-limited market data
//! API, an entitlement resolver that merges two eventually-consistent
//! remote sources into a single fact, a portfolio synchronization engine,
//! and a price alert evaluation loop. The hosted document store is a
//! black box behind the traits in [`store`]; UI, routing and auth live
//! outside this crate.

pub mod alerts;
pub mod constants;
pub mod entitlement;
pub mod errors;
pub mod limits;
pub mod market_data;
pub mod portfolio;
pub mod settings;
pub mod store;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
