//! Book feed configuration
//!
//! Endpoint, symbol and subscription parameters for the `book` channel.

use crate::error::ConfigError;
use crate::orderbook::types::Precision;
use std::time::Duration;

/// Public WebSocket endpoint
pub const DEFAULT_WS_URL: &str = "wss://api-pub.bitfinex.com/ws/2";

/// Default trading pair
pub const DEFAULT_SYMBOL: &str = "tBTCUSD";

/// Default number of price levels per side
pub const DEFAULT_BOOK_LENGTH: u32 = 25;

/// Default interval between ladder renders
pub const DEFAULT_RENDER_INTERVAL_MS: u64 = 1000;

/// Supported book lengths (a 1-level snapshot is too short to classify)
const VALID_BOOK_LENGTHS: [u32; 3] = [25, 100, 250];

/// Feed configuration
///
/// ## Environment Variables
///
/// - `BITFINEX_WS_URL`: WebSocket endpoint (default: wss://api-pub.bitfinex.com/ws/2)
/// - `BOOK_SYMBOL`: Trading pair (default: tBTCUSD)
/// - `BOOK_PRECISION`: Initial precision P0..P4 (default: P0)
/// - `BOOK_LENGTH`: Levels per side, one of 25, 100, 250 (default: 25)
/// - `BOOK_RENDER_INTERVAL_MS`: Ladder render interval (default: 1000)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// WebSocket endpoint
    pub ws_url: String,

    /// Trading pair symbol, e.g. `tBTCUSD`
    pub symbol: String,

    /// Precision of the first subscription
    pub precision: Precision,

    /// Number of price levels per side requested from the feed
    pub length: u32,

    /// Interval between ladder renders
    pub render_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            precision: Precision::default(),
            length: DEFAULT_BOOK_LENGTH,
            render_interval: Duration::from_millis(DEFAULT_RENDER_INTERVAL_MS),
        }
    }
}

impl FeedConfig {
    /// Load feed configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if any variable is set to an invalid value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BITFINEX_WS_URL") {
            config.ws_url = url;
        }

        if let Some(symbol) = lookup("BOOK_SYMBOL") {
            config.symbol = symbol;
        }

        if let Some(precision) = lookup("BOOK_PRECISION") {
            config.precision = precision.parse()?;
        }

        if let Some(length) = lookup("BOOK_LENGTH") {
            config.length = length.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "BOOK_LENGTH",
                value: length.clone(),
            })?;
        }

        if let Some(interval) = lookup("BOOK_RENDER_INTERVAL_MS") {
            let millis: u64 = interval.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "BOOK_RENDER_INTERVAL_MS",
                value: interval.clone(),
            })?;
            config.render_interval = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values the feed would reject
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_BOOK_LENGTHS.contains(&self.length) {
            return Err(ConfigError::BookLength(self.length));
        }

        if self.symbol.len() < 2 || !self.symbol.starts_with('t') {
            return Err(ConfigError::Symbol(self.symbol.clone()));
        }

        if self.render_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "BOOK_RENDER_INTERVAL_MS",
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}
