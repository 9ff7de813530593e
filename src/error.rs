use crate::orderbook::types::ParsePrecisionError;
use thiserror::Error;

/// Invalid feed configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Precision(#[from] ParsePrecisionError),

    #[error("Invalid book length {0}: expected one of 25, 100, 250")]
    BookLength(u32),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Symbol must be a trading pair such as tBTCUSD, got '{0}'")]
    Symbol(String),
}

/// Errors raised by the feed transport
#[derive(Error, Debug)]
pub enum FeedError {
    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "websocket")]
    #[error("Connection throttled: {0}")]
    RateLimit(#[from] crate::feed::rate_limiter::RateLimiterError),

    #[error("Subscription rejected (code {code}): {msg}")]
    Subscription { code: i64, msg: String },
}

impl FeedError {
    /// Whether reconnecting may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FeedError::Subscription { .. } | FeedError::Json(_))
    }
}

/// Result of a feed transport operation
pub type Result<T> = std::result::Result<T, FeedError>;
