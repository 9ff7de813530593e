//! Feed transport for the public `book` channel
//!
//! The transport owns the socket lifecycle (connect, subscribe at the selected
//! precision, heartbeats, reconnect with backoff) and forwards raw text frames
//! to the [`BookManager`](crate::orderbook::BookManager) as [`FeedSignal`]s.

pub mod subscription;

#[cfg(feature = "websocket")]
pub mod rate_limiter;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use subscription::{FeedEvent, SubscribeRequest};

#[cfg(feature = "websocket")]
pub use websocket::BookFeedClient;

/// Notification sent from the transport to the book manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSignal {
    /// Socket open and subscribe request sent
    Connected,

    /// Raw text frame
    Message(String),

    /// Socket closed or failed
    Disconnected,
}
