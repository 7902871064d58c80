/// Quiet period before a local holdings change is written back remotely
pub const WRITE_DEBOUNCE_MS: u64 = 500;

/// Delay before the first portfolio price refresh after startup
pub const PRICE_REFRESH_INITIAL_DELAY_SECS: u64 = 2;

/// Interval between portfolio price refreshes
pub const PRICE_REFRESH_INTERVAL_SECS: u64 = 30;

/// Interval between alert evaluation passes
pub const ALERT_EVAL_INTERVAL_SECS: u64 = 30;

/// Maximum holdings on the free plan
pub const FREE_PLAN_MAX_HOLDINGS: usize = 5;

/// Maximum active alerts on the free plan
pub const FREE_PLAN_MAX_ALERTS: usize = 2;
