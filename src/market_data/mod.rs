pub(crate) mod market_data_cache;
pub(crate) mod market_data_client;
pub(crate) mod market_data_constants;
pub(crate) mod market_data_errors;
pub(crate) mod market_data_model;
pub(crate) mod market_data_traits;

// Re-export the public interface
pub use market_data_cache::ResponseCache;
pub use market_data_client::MarketDataClient;
pub use market_data_constants::*;
pub use market_data_model::{NftCollection, NftLinks, PortfolioPrice, Quote, SearchResult};
pub use market_data_traits::{HttpTransport, QuoteProvider, ReqwestTransport};

// Re-export error types for convenience
pub use market_data_errors::MarketDataError;
