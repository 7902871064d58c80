pub mod clock;

pub use clock::{Clock, SystemClock};

/// Normalize a user-entered coin identifier to the API's id form:
/// lowercase with whitespace runs collapsed to a single dash.
pub fn normalize_coin_id(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
