//! Book channel subscription messages
//!
//! Outgoing subscribe request and the JSON event objects the feed sends
//! alongside channel data (`info`, `subscribed`, `error`, ...).

use crate::orderbook::types::Precision;
use serde::{Deserialize, Serialize};

/// Update frequency token, `F0` is realtime
const REALTIME_FREQUENCY: &str = "F0";

/// Subscribe request for the `book` channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    pub event: &'static str,
    pub channel: &'static str,
    pub symbol: String,
    pub prec: Precision,
    pub freq: &'static str,
    pub len: String,
}

impl SubscribeRequest {
    /// Subscribe to the aggregated book of `symbol` at the given precision
    pub fn book(symbol: impl Into<String>, precision: Precision, length: u32) -> Self {
        Self {
            event: "subscribe",
            channel: "book",
            symbol: symbol.into(),
            prec: precision,
            freq: REALTIME_FREQUENCY,
            len: length.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Control event received on the socket
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum FeedEvent {
    /// Sent on connect and on platform status changes
    Info {
        #[serde(default)]
        version: Option<u32>,
    },

    /// Channel subscription acknowledged
    Subscribed {
        #[serde(rename = "chanId")]
        chan_id: u64,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        prec: Option<String>,
    },

    /// Request rejected
    Error {
        #[serde(default)]
        code: i64,
        #[serde(default)]
        msg: String,
    },

    /// Any other event (`conf`, `pong`, `unsubscribed`, ...)
    #[serde(other)]
    Other,
}

impl FeedEvent {
    /// Parse a text frame as a control event, `None` for channel data
    pub fn parse(text: &str) -> Option<Self> {
        if !is_event(text) {
            return None;
        }
        serde_json::from_str(text).ok()
    }
}

/// Control events are JSON objects; channel data are arrays
pub fn is_event(text: &str) -> bool {
    text.trim_start().starts_with('{')
}
