//! Analysis gateway error types.

use std::sync::Arc;

/// Errors from the tone-analysis gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Nothing to analyze (empty input text).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Rate limited by the analysis endpoint.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Response could not be decoded into a tone analysis.
    #[error("parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Timeouts, transport failures, throttling, and server errors are
    /// transient; a malformed response or a client error will not get
    /// better by asking again, so those are discarded after one
    /// attempt. Either way the call counted against the budget the
    /// moment it was admitted.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Timeout | GatewayError::Network(_) | GatewayError::RateLimited => true,
            GatewayError::HttpError { status } => *status >= 500,
            GatewayError::InvalidInput(_) | GatewayError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { GatewayError::Timeout } else { GatewayError::Network(Arc::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::HttpError { status: 502 };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::Timeout.is_transient());
        assert!(GatewayError::RateLimited.is_transient());
        assert!(GatewayError::HttpError { status: 503 }.is_transient());
        assert!(!GatewayError::HttpError { status: 400 }.is_transient());
        assert!(!GatewayError::Parse("not json".into()).is_transient());
        assert!(!GatewayError::InvalidInput("empty".into()).is_transient());
    }
}
