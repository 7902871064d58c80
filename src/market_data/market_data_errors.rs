use thiserror::Error;

/// Errors surfaced by the market data client.
///
/// The HTTP status is carried when the upstream responded at all so the
/// retry loop can distinguish server-side trouble from bad requests.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response format: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MarketDataError {
    /// Whether the failed request may be retried.
    ///
    /// Only server errors (5xx) and rate limiting (429) are transient;
    /// other 4xx responses, transport failures and decode failures are
    /// terminal and fail the call immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Network(_) | Self::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> MarketDataError {
        MarketDataError::Http {
            status,
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(http(500).is_retryable());
        assert!(http(503).is_retryable());
        assert!(http(429).is_retryable());
    }

    #[test]
    fn test_client_errors_are_terminal() {
        assert!(!http(400).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!http(418).is_retryable());
    }

    #[test]
    fn test_decode_errors_are_terminal() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(!MarketDataError::from(err).is_retryable());
    }
}
