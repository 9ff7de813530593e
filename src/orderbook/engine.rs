//! Order book reconstruction engine
//!
//! Applies classified feed messages to an owned [`OrderBook`]. Each side is a
//! price-keyed `BTreeMap`, so price uniqueness and side ordering hold after
//! every mutation without a resort pass.
//!
//! Update routing:
//! - `amount > 0` targets bids, `amount < 0` targets asks
//! - `amount == 0` carries no side, so it is treated as a removal and the price
//!   is removed from every side that holds it
//! - `count == 0` removes the price from the target side (no-op when absent)

use crate::orderbook::classifier::ClassifiedMessage;
use crate::orderbook::types::{BookView, OrderBook, PriceLevel, Precision, Side};
use crate::orderbook::view;
use rust_decimal::Decimal;
use tracing::{debug, trace};

/// Effect of a single update on the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new level was created
    Inserted(Side),

    /// An existing level was overwritten
    Modified(Side),

    /// A level was deleted
    Removed(Side),

    /// Nothing changed (removal of an unknown price)
    Ignored,
}

/// Effect of applying a classified message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Book replaced by a snapshot with this many levels per side
    Snapshot { bids: usize, asks: usize },

    /// Single level update
    Update(UpdateOutcome),

    /// Heartbeat, no state change
    Heartbeat,

    /// Message dropped
    Unrecognized,
}

/// Owner of the two-sided book
#[derive(Debug, Clone, Default)]
pub struct OrderBookEngine {
    book: OrderBook,
}

impl OrderBookEngine {
    /// Create an engine with an empty book
    pub fn new() -> Self {
        Self {
            book: OrderBook::new(),
        }
    }

    /// Current book state
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Apply any classified message
    pub fn apply(&mut self, msg: ClassifiedMessage) -> ApplyOutcome {
        match msg {
            ClassifiedMessage::Heartbeat => ApplyOutcome::Heartbeat,
            ClassifiedMessage::Unrecognized => ApplyOutcome::Unrecognized,
            ClassifiedMessage::Snapshot { bids, asks } => {
                self.apply_snapshot(bids, asks);
                ApplyOutcome::Snapshot {
                    bids: self.book.bids.len(),
                    asks: self.book.asks.len(),
                }
            }
            ClassifiedMessage::Update {
                price,
                count,
                amount,
            } => ApplyOutcome::Update(self.apply_update(price, count, amount)),
        }
    }

    /// Replace both sides wholesale
    ///
    /// Amount signs are stripped; the side is given by the list a level comes
    /// in. Entries with zero count or zero amount are skipped, and a price
    /// repeated within one list keeps its last occurrence.
    pub fn apply_snapshot(
        &mut self,
        bids: impl IntoIterator<Item = PriceLevel>,
        asks: impl IntoIterator<Item = PriceLevel>,
    ) {
        self.book.bids.clear();
        self.book.asks.clear();

        for level in bids {
            Self::insert_resting(&mut self.book, Side::Bid, level);
        }
        for level in asks {
            Self::insert_resting(&mut self.book, Side::Ask, level);
        }

        self.book.touch();
        debug!(
            bid_levels = self.book.bids.len(),
            ask_levels = self.book.asks.len(),
            "Applied book snapshot"
        );
    }

    /// Apply one price-level update
    pub fn apply_update(&mut self, price: Decimal, count: u32, amount: Decimal) -> UpdateOutcome {
        let outcome = match Side::from_amount(amount) {
            None => self.remove_anywhere(price),
            Some(side) if count == 0 => match self.book.side_mut(side).remove(&price) {
                Some(_) => UpdateOutcome::Removed(side),
                None => UpdateOutcome::Ignored,
            },
            Some(side) => {
                let level = PriceLevel::new(price, count, amount.abs());
                match self.book.side_mut(side).insert(price, level) {
                    Some(_) => UpdateOutcome::Modified(side),
                    None => UpdateOutcome::Inserted(side),
                }
            }
        };

        if outcome != UpdateOutcome::Ignored {
            self.book.touch();
        }

        trace!(%price, count, %amount, ?outcome, "Applied book update");
        outcome
    }

    /// Drop every level
    pub fn clear(&mut self) {
        self.book.bids.clear();
        self.book.asks.clear();
        self.book.touch();
    }

    /// Display view of the whole book
    pub fn derived_view(&self, precision: Precision) -> BookView {
        view::derive_view(&self.book, precision)
    }

    /// Display view limited to the top `depth` levels per side
    pub fn derived_view_depth(&self, precision: Precision, depth: usize) -> BookView {
        view::derive_view_depth(&self.book, precision, depth)
    }

    /// Remove `price` from both sides; a crossed book may hold it on each
    fn remove_anywhere(&mut self, price: Decimal) -> UpdateOutcome {
        let bid = self.book.bids.remove(&price).is_some();
        let ask = self.book.asks.remove(&price).is_some();

        match (bid, ask) {
            (true, _) => UpdateOutcome::Removed(Side::Bid),
            (false, true) => UpdateOutcome::Removed(Side::Ask),
            (false, false) => UpdateOutcome::Ignored,
        }
    }

    fn insert_resting(book: &mut OrderBook, side: Side, level: PriceLevel) {
        if level.count == 0 || level.amount.is_zero() {
            return;
        }
        book.side_mut(side).insert(level.price, level.unsigned());
    }
}
