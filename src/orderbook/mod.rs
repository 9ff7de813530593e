//! Live order book for a Bitfinex `book` channel subscription
//!
//! This module rebuilds a price-aggregated book from the channel stream:
//! - Classification of raw channel frames (heartbeat, snapshot, update)
//! - Snapshot replacement and incremental level updates
//! - Derived display views with significant-digit price rounding and
//!   depth fractions
//!
//! Architecture: one engine per subscription, wrapped by [`BookManager`]
//! behind a single lock so mutations and views never interleave.

pub mod classifier;
pub mod engine;
pub mod manager;
pub mod types;
pub mod view;

pub use classifier::{channel_of, classify, classify_text, ClassifiedMessage};
pub use engine::{ApplyOutcome, OrderBookEngine, UpdateOutcome};
pub use manager::BookManager;
pub use types::{BookView, ConnectionState, LevelView, OrderBook, Precision, PriceLevel, Side};
pub use view::{derive_view, derive_view_depth, format_significant_digits};
