/// Base URL of the public market data API
pub const API_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// How long a cached response stays valid
pub const CACHE_TTL_SECS: i64 = 60;

/// Upper bound on cached responses before the cache sweeps itself
pub const CACHE_MAX_ENTRIES: usize = 256;

/// Additional attempts after the first failed request
pub const MAX_RETRIES: u32 = 3;

/// Fixed delay between retry attempts
pub const RETRY_DELAY_MS: u64 = 2000;

/// Per-request timeout for the HTTP client
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
