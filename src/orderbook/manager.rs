//! Shared book state for the feed and its consumers
//!
//! Wraps the [`OrderBookEngine`] and [`ConnectionState`] in a single lock so
//! that every mutation is exclusive and every view is taken from a consistent
//! book. Precision changes are broadcast to the transport through a watch
//! channel, which resubscribes; the book is rebuilt from the next snapshot.

use crate::feed::subscription::FeedEvent;
use crate::feed::FeedSignal;
use crate::orderbook::classifier::{self, ClassifiedMessage};
use crate::orderbook::engine::{ApplyOutcome, OrderBookEngine};
use crate::orderbook::types::{BookView, ConnectionState, OrderBook, Precision};
use serde_json::Value;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, error, info, warn};

/// Internal state guarded by the manager lock
struct BookState {
    /// Book reconstruction engine
    engine: OrderBookEngine,

    /// Transport status and selected precision
    connection: ConnectionState,

    /// Channel id assigned by the last subscription acknowledgement; channel
    /// frames carrying another id are dropped
    channel_id: Option<u64>,

    /// Last time a snapshot or update changed the book
    last_update_time: i64,
}

/// Manager for the live book of one symbol
pub struct BookManager {
    /// Engine and connection state
    state: RwLock<BookState>,

    /// Precision broadcast to the transport
    precision_tx: watch::Sender<Precision>,
}

impl BookManager {
    /// Create a manager with an empty book at the given precision
    pub fn new(precision: Precision) -> Self {
        let (precision_tx, _) = watch::channel(precision);

        Self {
            state: RwLock::new(BookState {
                engine: OrderBookEngine::new(),
                connection: ConnectionState {
                    connected: false,
                    precision,
                },
                channel_id: None,
                last_update_time: 0,
            }),
            precision_tx,
        }
    }

    /// Receiver notified whenever the precision changes
    pub fn precision_receiver(&self) -> watch::Receiver<Precision> {
        self.precision_tx.subscribe()
    }

    /// Current connection status and precision
    pub async fn connection_state(&self) -> ConnectionState {
        self.state.read().await.connection
    }

    /// Channel id of the active subscription, if acknowledged
    pub async fn channel_id(&self) -> Option<u64> {
        self.state.read().await.channel_id
    }

    /// Milliseconds since the book last changed, `None` before the first snapshot
    pub async fn last_update_age_ms(&self) -> Option<i64> {
        let state = self.state.read().await;
        if state.last_update_time == 0 {
            return None;
        }
        Some(chrono::Utc::now().timestamp_millis() - state.last_update_time)
    }

    /// Copy of the current book
    pub async fn book(&self) -> OrderBook {
        self.state.read().await.engine.book().clone()
    }

    /// Display view of the whole book at the current precision
    pub async fn view(&self) -> BookView {
        let state = self.state.read().await;
        state.engine.derived_view(state.connection.precision)
    }

    /// Display view of the top `depth` levels per side at the current precision
    pub async fn view_depth(&self, depth: usize) -> BookView {
        let state = self.state.read().await;
        state
            .engine
            .derived_view_depth(state.connection.precision, depth)
    }

    /// Classify and apply one channel data frame
    ///
    /// Once a subscription is acknowledged, frames for any other channel are
    /// dropped as unrecognized.
    pub async fn handle_text(&self, text: &str) -> ApplyOutcome {
        let msg: Value = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "Feed message is not valid JSON");
                return ApplyOutcome::Unrecognized;
            }
        };

        if let (Some(expected), Some(received)) =
            (self.channel_id().await, classifier::channel_of(&msg))
        {
            if expected != received {
                debug!(expected, received, "Dropped frame for another channel");
                return ApplyOutcome::Unrecognized;
            }
        }

        self.handle_message(classifier::classify(&msg)).await
    }

    /// Apply an already classified message
    pub async fn handle_message(&self, msg: ClassifiedMessage) -> ApplyOutcome {
        let mut state = self.state.write().await;
        let outcome = state.engine.apply(msg);

        match outcome {
            ApplyOutcome::Snapshot { bids, asks } => {
                state.last_update_time = chrono::Utc::now().timestamp_millis();
                info!(
                    bid_levels = bids,
                    ask_levels = asks,
                    spread = ?state.engine.book().spread(),
                    precision = %state.connection.precision,
                    "Book snapshot received"
                );
            }
            ApplyOutcome::Update(_) => {
                state.last_update_time = chrono::Utc::now().timestamp_millis();
            }
            ApplyOutcome::Heartbeat => debug!("Heartbeat"),
            ApplyOutcome::Unrecognized => debug!("Dropped unrecognized feed message"),
        }

        outcome
    }

    /// Record a control event from the feed
    pub async fn handle_event(&self, event: FeedEvent) {
        match event {
            FeedEvent::Info { version } => {
                info!(version = ?version, "Feed info received");
            }
            FeedEvent::Subscribed {
                chan_id,
                symbol,
                prec,
            } => {
                let mut state = self.state.write().await;
                state.channel_id = Some(chan_id);
                info!(
                    chan_id,
                    symbol = symbol.as_deref().unwrap_or("?"),
                    precision = prec.as_deref().unwrap_or("?"),
                    "Subscribed to book channel"
                );
            }
            FeedEvent::Error { code, msg } => {
                error!(code, msg = %msg, "Feed rejected request");
            }
            FeedEvent::Other => debug!("Ignored feed event"),
        }
    }

    /// Update connection status; a disconnect drops the now stale book
    pub async fn set_connected(&self, connected: bool) {
        let mut state = self.state.write().await;
        if state.connection.connected == connected {
            return;
        }

        state.connection.connected = connected;
        if connected {
            info!("Book feed connected");
        } else {
            state.engine.clear();
            state.channel_id = None;
            warn!("Book feed disconnected, book cleared");
        }
    }

    /// Select a new precision
    ///
    /// Clears the book and notifies the transport, which resubscribes. Returns
    /// false when the precision was already selected.
    pub async fn set_precision(&self, precision: Precision) -> bool {
        let mut state = self.state.write().await;
        if state.connection.precision == precision {
            return false;
        }

        info!(
            from = %state.connection.precision,
            to = %precision,
            "Precision changed, resubscribing"
        );

        state.connection.precision = precision;
        state.engine.clear();
        self.precision_tx.send_replace(precision);
        true
    }

    /// Consume transport signals until the channel closes
    pub async fn run(&self, mut signals: mpsc::UnboundedReceiver<FeedSignal>) {
        while let Some(signal) = signals.recv().await {
            match signal {
                FeedSignal::Connected => self.set_connected(true).await,
                FeedSignal::Disconnected => self.set_connected(false).await,
                FeedSignal::Message(text) => match FeedEvent::parse(&text) {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        self.handle_text(&text).await;
                    }
                },
            }
        }

        warn!("Feed signal channel closed");
        self.set_connected(false).await;
    }
}
