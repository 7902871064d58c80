pub(crate) mod holdings_model;
pub(crate) mod sync_engine;

pub use holdings_model::*;
pub use sync_engine::PortfolioSyncEngine;
