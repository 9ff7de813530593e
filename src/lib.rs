// Library exports for bitfinex-book

pub mod config; // Configuration management
pub mod error;
pub mod feed; // Bitfinex book channel transport
pub mod orderbook; // Book reconstruction and derived views
pub mod report; // Terminal ladder rendering
