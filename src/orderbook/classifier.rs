//! Feed message classification
//!
//! Turns one decoded `book` channel message into a [`ClassifiedMessage`].
//! Parsing is lenient: anything that does not match a known shape becomes
//! [`ClassifiedMessage::Unrecognized`] instead of an error, so a single odd
//! frame never interrupts the stream.
//!
//! Recognized shapes (`chan` is the channel id):
//! - `[chan, "hb"]` heartbeat
//! - `[chan, [[price, count, amount], ...]]` snapshot (more than 3 entries)
//! - `[chan, [price, count, amount]]` single update
//! - `[price, count, amount]` bare update

use crate::orderbook::types::{PriceLevel, Side};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

/// Second-field marker of a heartbeat message
pub const HEARTBEAT_TOKEN: &str = "hb";

/// Batches longer than this are full snapshots
const SNAPSHOT_MIN_LEN: usize = 4;

/// Number of fields in a `(price, count, amount)` tuple
const LEVEL_TUPLE_LEN: usize = 3;

/// Result of classifying a feed message
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedMessage {
    /// Keep-alive, no state change
    Heartbeat,

    /// Full replacement of both sides. Amounts keep their wire sign.
    Snapshot {
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
    },

    /// Incremental change of one price level
    Update {
        price: Decimal,
        count: u32,
        amount: Decimal,
    },

    /// Any other shape; dropped by the engine
    Unrecognized,
}

/// Decode a text frame and classify it
pub fn classify_text(text: &str) -> ClassifiedMessage {
    match serde_json::from_str::<Value>(text) {
        Ok(msg) => classify(&msg),
        Err(e) => {
            debug!(error = %e, "Feed message is not valid JSON");
            ClassifiedMessage::Unrecognized
        }
    }
}

/// Channel id of a channel frame (`[chan, "hb"]` or `[chan, [...]]`)
///
/// `None` for bare update tuples and anything else without a channel prefix.
pub fn channel_of(msg: &Value) -> Option<u64> {
    let fields = msg.as_array()?;
    match fields.get(1)? {
        Value::String(_) | Value::Array(_) => fields.first()?.as_u64(),
        _ => None,
    }
}

/// Classify one decoded feed message
pub fn classify(msg: &Value) -> ClassifiedMessage {
    let Some(fields) = msg.as_array() else {
        return ClassifiedMessage::Unrecognized;
    };

    match fields.get(1) {
        Some(Value::String(token)) if token == HEARTBEAT_TOKEN => ClassifiedMessage::Heartbeat,
        Some(Value::Array(batch)) if batch.len() >= SNAPSHOT_MIN_LEN => classify_snapshot(batch),
        Some(Value::Array(batch)) if batch.len() == LEVEL_TUPLE_LEN => classify_update(batch),
        Some(Value::Array(_)) => ClassifiedMessage::Unrecognized,
        Some(_) if fields.len() == LEVEL_TUPLE_LEN => classify_update(fields),
        _ => ClassifiedMessage::Unrecognized,
    }
}

fn classify_update(tuple: &[Value]) -> ClassifiedMessage {
    match parse_level(tuple) {
        Some(level) => ClassifiedMessage::Update {
            price: level.price,
            count: level.count,
            amount: level.amount,
        },
        None => ClassifiedMessage::Unrecognized,
    }
}

fn classify_snapshot(entries: &[Value]) -> ClassifiedMessage {
    let mut bids = Vec::with_capacity(entries.len() / 2);
    let mut asks = Vec::with_capacity(entries.len() / 2);
    let mut dropped = 0usize;

    for entry in entries {
        let Some(level) = entry.as_array().and_then(|tuple| parse_level(tuple)) else {
            dropped += 1;
            continue;
        };

        match Side::from_amount(level.amount) {
            Some(Side::Bid) => bids.push(level),
            Some(Side::Ask) => asks.push(level),
            None => {
                warn!(price = %level.price, "Snapshot entry with zero amount dropped");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!(
            dropped,
            total = entries.len(),
            "Dropped malformed snapshot entries"
        );
    }

    if bids.is_empty() && asks.is_empty() {
        return ClassifiedMessage::Unrecognized;
    }

    ClassifiedMessage::Snapshot { bids, asks }
}

/// Parse a `(price, count, amount)` tuple
///
/// The price must be strictly positive and `price * |amount|` must fit in a
/// `Decimal`.
fn parse_level(tuple: &[Value]) -> Option<PriceLevel> {
    if tuple.len() != LEVEL_TUPLE_LEN {
        return None;
    }

    let price = parse_decimal(&tuple[0])?;
    let count = parse_count(&tuple[1])?;
    let amount = parse_decimal(&tuple[2])?;

    if price <= Decimal::ZERO {
        return None;
    }

    let level = PriceLevel::new(price, count, amount);
    if level.checked_total().is_none() {
        debug!(%price, %amount, "Level notional overflows, dropped");
        return None;
    }

    Some(level)
}

/// Numbers are read from their textual form so that `0.1` stays exactly `0.1`
fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn parse_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                return u32::try_from(count).ok();
            }
            let f = n.as_f64()?;
            if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
                Some(f as u32)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
