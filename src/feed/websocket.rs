//! WebSocket client for the public `book` channel
//!
//! Connects, subscribes at the currently selected precision and forwards raw
//! text frames to the book manager. Implements exponential backoff
//! reconnection and resubscribes immediately when the precision changes.

use crate::config::FeedConfig;
use crate::error::{FeedError, Result};
use crate::feed::rate_limiter::RateLimiter;
use crate::feed::subscription::{FeedEvent, SubscribeRequest};
use crate::feed::FeedSignal;
use crate::orderbook::types::Precision;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Maximum reconnection delay (30 seconds)
const MAX_RECONNECT_DELAY_SECS: u64 = 30;

/// Retry counter wraps after this many consecutive failures
const MAX_RETRY_EXPONENT: u32 = 10;

/// Why a socket session ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Server closed the socket
    Closed,

    /// A new precision was selected; reconnect right away
    PrecisionChanged,

    /// Nobody listens any more; stop the client
    ReceiverDropped,
}

/// WebSocket client for one symbol's book channel
pub struct BookFeedClient {
    config: FeedConfig,
    precision_rx: watch::Receiver<Precision>,
    signal_sender: mpsc::UnboundedSender<FeedSignal>,
    rate_limiter: RateLimiter,
}

impl BookFeedClient {
    /// Create a new client
    ///
    /// Returns the client handle and a receiver for feed signals. The
    /// precision receiver usually comes from
    /// [`BookManager::precision_receiver`](crate::orderbook::BookManager::precision_receiver).
    pub fn new(
        config: FeedConfig,
        precision_rx: watch::Receiver<Precision>,
    ) -> (Self, mpsc::UnboundedReceiver<FeedSignal>) {
        let (signal_sender, signal_receiver) = mpsc::unbounded_channel();

        let client = Self {
            config,
            precision_rx,
            signal_sender,
            rate_limiter: RateLimiter::new(),
        };

        (client, signal_receiver)
    }

    /// Start the client with automatic reconnection
    ///
    /// Spawns a background task that:
    /// 1. Waits for a connection slot from the rate limiter
    /// 2. Connects and sends the subscribe request
    /// 3. Forwards text frames until the socket closes or precision changes
    /// 4. Retries failures with exponential backoff (1s, 2s, 4s, ... max 30s)
    pub fn start(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut retry_count = 0;

            loop {
                if let Err(e) = self.rate_limiter.wait().await {
                    warn!(symbol = %self.config.symbol, error = %e, "Connection attempt throttled");
                    continue;
                }

                let result = self.connect_and_process().await;
                self.notify(FeedSignal::Disconnected);

                match result {
                    Ok(SessionEnd::ReceiverDropped) => {
                        info!(symbol = %self.config.symbol, "Signal receiver dropped, stopping feed client");
                        break;
                    }
                    Ok(SessionEnd::PrecisionChanged) => {
                        retry_count = 0;
                        continue;
                    }
                    Ok(SessionEnd::Closed) => {
                        retry_count = 0;
                        info!(symbol = %self.config.symbol, "Feed closed by server, reconnecting");
                    }
                    Err(e) if !e.is_retryable() => {
                        error!(symbol = %self.config.symbol, error = %e, "Feed failed permanently");
                        break;
                    }
                    Err(e) => {
                        let delay_secs =
                            std::cmp::min(2_u64.pow(retry_count), MAX_RECONNECT_DELAY_SECS);

                        warn!(
                            symbol = %self.config.symbol,
                            error = %e,
                            retry_count,
                            delay_secs,
                            "Feed connection failed, retrying with exponential backoff"
                        );

                        sleep(Duration::from_secs(delay_secs)).await;
                        retry_count += 1;

                        if retry_count > MAX_RETRY_EXPONENT {
                            retry_count = 0;
                        }
                    }
                }
            }
        })
    }

    /// Send a signal, false when the receiver is gone
    fn notify(&self, signal: FeedSignal) -> bool {
        self.signal_sender.send(signal).is_ok()
    }

    /// Connect, subscribe and forward messages until the session ends
    async fn connect_and_process(&mut self) -> Result<SessionEnd> {
        let precision = *self.precision_rx.borrow_and_update();
        let symbol = self.config.symbol.clone();

        info!(symbol = %symbol, url = %self.config.ws_url, %precision, "Connecting to book feed");

        let (ws_stream, _) = connect_async(self.config.ws_url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        let request = SubscribeRequest::book(symbol.as_str(), precision, self.config.length);
        write.send(Message::Text(request.to_json()?.into())).await?;
        info!(symbol = %symbol, %precision, "Subscribe request sent");

        if !self.notify(FeedSignal::Connected) {
            return Ok(SessionEnd::ReceiverDropped);
        }

        loop {
            tokio::select! {
                changed = self.precision_rx.changed() => {
                    if changed.is_err() {
                        // Manager dropped its sender
                        return Ok(SessionEnd::ReceiverDropped);
                    }
                    let next = *self.precision_rx.borrow();
                    info!(symbol = %symbol, precision = %next, "Precision changed, closing socket");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(symbol = %symbol, error = %e, "Failed to send close frame");
                    }
                    return Ok(SessionEnd::PrecisionChanged);
                }
                msg = read.next() => {
                    let Some(msg) = msg else {
                        info!(symbol = %symbol, "Feed stream ended");
                        return Ok(SessionEnd::Closed);
                    };

                    match msg? {
                        Message::Text(text) => {
                            let rejection = match FeedEvent::parse(text.as_str()) {
                                Some(FeedEvent::Error { code, msg }) => {
                                    Some(FeedError::Subscription { code, msg })
                                }
                                _ => None,
                            };

                            if !self.notify(FeedSignal::Message(text.to_string())) {
                                return Ok(SessionEnd::ReceiverDropped);
                            }
                            if let Some(e) = rejection {
                                return Err(e);
                            }
                        }
                        Message::Ping(data) => {
                            debug!(symbol = %symbol, "Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Message::Pong(_) => {
                            debug!(symbol = %symbol, "Received pong");
                        }
                        Message::Close(frame) => {
                            info!(symbol = %symbol, frame = ?frame, "WebSocket close frame received");
                            return Ok(SessionEnd::Closed);
                        }
                        Message::Binary(_) => {
                            warn!(symbol = %symbol, "Received unexpected binary message");
                        }
                        Message::Frame(_) => {
                            // Raw frames are handled internally by tungstenite
                        }
                    }
                }
            }
        }
    }
}
