//! Order book data structures and types
//!
//! Core entities for book reconstruction: price levels, the two-sided book,
//! display precision and the read-only views handed to consumers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Side of the book a level rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side (positive amount on the wire)
    Bid,

    /// Sell side (negative amount on the wire)
    Ask,
}

impl Side {
    /// Side encoded by the sign of a wire amount, `None` for zero
    pub fn from_amount(amount: Decimal) -> Option<Self> {
        match amount.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => Some(Side::Bid),
            std::cmp::Ordering::Less => Some(Side::Ask),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// One aggregated resting quantity at a price point
///
/// On the wire `amount` is signed (positive = bid, negative = ask). Levels
/// stored inside an [`OrderBook`] side keep the magnitude only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price of the level, strictly positive
    pub price: Decimal,

    /// Number of orders aggregated at this price (0 means "remove")
    pub count: u32,

    /// Total quantity at this price
    pub amount: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, count: u32, amount: Decimal) -> Self {
        Self {
            price,
            count,
            amount,
        }
    }

    /// Notional value of the level: `|amount| * price`
    ///
    /// Saturates at `Decimal::MAX` when the product does not fit.
    pub fn total(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::MAX)
    }

    /// Notional value, `None` when the product overflows
    pub fn checked_total(&self) -> Option<Decimal> {
        self.amount.abs().checked_mul(self.price)
    }

    /// Copy of this level with the side sign stripped from `amount`
    pub(crate) fn unsigned(&self) -> Self {
        Self {
            amount: self.amount.abs(),
            ..*self
        }
    }
}

/// Two-sided order book
///
/// Both sides are keyed by price in a `BTreeMap`, so each price appears at most
/// once per side and iteration order is fixed by the key. Bids are read in
/// reverse (best bid first), asks forward (best ask first).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBook {
    /// Bid levels: price → level (read descending, best bid first)
    pub bids: BTreeMap<Decimal, PriceLevel>,

    /// Ask levels: price → level (read ascending, best ask first)
    pub asks: BTreeMap<Decimal, PriceLevel>,

    /// Timestamp of last mutation (milliseconds since Unix epoch)
    pub timestamp: i64,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Get best bid level (highest price)
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.values().next_back() // BTreeMap is ascending, so last key is highest
    }

    /// Get best ask level (lowest price)
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.values().next()
    }

    /// Best ask minus best bid, if both sides are populated
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    /// Bid levels, highest price first
    pub fn bid_levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.bids.values().rev()
    }

    /// Ask levels, lowest price first
    pub fn ask_levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.asks.values()
    }

    /// Levels of one side in book order
    pub fn levels(&self, side: Side) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match side {
            Side::Bid => Box::new(self.bid_levels()),
            Side::Ask => Box::new(self.ask_levels()),
        }
    }

    /// Mutable map backing one side
    pub(crate) fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub(crate) fn touch(&mut self) {
        self.timestamp = chrono::Utc::now().timestamp_millis();
    }
}

/// Display precision of the book feed
///
/// Selected per subscription; also decides how many significant digits the
/// derived view keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Precision {
    /// Finest: 5 significant digits
    #[default]
    P0,
    P1,
    P2,
    P3,
    /// Coarsest: 1 significant digit
    P4,
}

impl Precision {
    pub const ALL: [Precision; 5] = [
        Precision::P0,
        Precision::P1,
        Precision::P2,
        Precision::P3,
        Precision::P4,
    ];

    /// Number of significant digits shown at this precision
    pub fn significant_digits(self) -> u32 {
        match self {
            Precision::P0 => 5,
            Precision::P1 => 4,
            Precision::P2 => 3,
            Precision::P3 => 2,
            Precision::P4 => 1,
        }
    }

    /// Token used by the feed (`"P0"` … `"P4"`)
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::P0 => "P0",
            Precision::P1 => "P1",
            Precision::P2 => "P2",
            Precision::P3 => "P3",
            Precision::P4 => "P4",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a precision token is not one of `P0`..`P4`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid precision '{0}': expected one of P0, P1, P2, P3, P4")]
pub struct ParsePrecisionError(pub String);

impl FromStr for Precision {
    type Err = ParsePrecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P0" => Ok(Precision::P0),
            "P1" => Ok(Precision::P1),
            "P2" => Ok(Precision::P2),
            "P3" => Ok(Precision::P3),
            "P4" => Ok(Precision::P4),
            _ => Err(ParsePrecisionError(s.to_string())),
        }
    }
}

/// Transport-facing connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionState {
    /// Whether the feed socket is currently subscribed
    pub connected: bool,

    /// Precision requested for the current (or next) subscription
    pub precision: Precision,
}

/// One row of the derived view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelView {
    /// Price rounded to the view precision
    pub price: Decimal,

    /// Number of orders at this level
    pub count: u32,

    /// Quantity magnitude rounded to the view precision
    pub amount: Decimal,

    /// `amount * price`, computed before rounding, then rounded
    pub total: Decimal,

    /// Quantity relative to the largest quantity on the same side, in (0, 1]
    pub depth_fraction: f64,
}

/// Read-only projection of the book for consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookView {
    /// Precision the values were rounded to
    pub precision: Precision,

    /// Bid rows, best (highest) first
    pub bids: Vec<LevelView>,

    /// Ask rows, best (lowest) first
    pub asks: Vec<LevelView>,

    /// Book timestamp the view was taken from (milliseconds since Unix epoch)
    pub timestamp: i64,
}
