// Unit tests for the shared book manager

use bitfinex_book::feed::{FeedEvent, FeedSignal};
use bitfinex_book::orderbook::*;
use std::sync::Arc;
use tokio::sync::mpsc;

const SNAPSHOT: &str = "[17082,[[100,1,2],[99,1,3],[101,1,-1],[102,1,-2]]]";

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_scenario_through_text_frames() {
        let manager = BookManager::new(Precision::P0);

        manager.handle_text(SNAPSHOT).await;
        manager.handle_text("[17082,[100,0,2]]").await;
        manager.handle_text("[17082,[98,1,5]]").await;

        let view = manager.view().await;
        let bids: Vec<_> = view.bids.iter().map(|l| (l.price, l.count, l.amount)).collect();
        let asks: Vec<_> = view.asks.iter().map(|l| l.price).collect();

        assert_eq!(bids, vec![(dec!(99), 1, dec!(3)), (dec!(98), 1, dec!(5))]);
        assert_eq!(asks, vec![dec!(101), dec!(102)]);
    }

    #[tokio::test]
    async fn test_unrecognized_frames_leave_book_untouched() {
        let manager = BookManager::new(Precision::P0);
        manager.handle_text(SNAPSHOT).await;
        let before = manager.book().await;

        for text in ["garbage", "[17082,[1,2]]", "[17082,\"cs\",1]", "{}"] {
            assert_eq!(manager.handle_text(text).await, ApplyOutcome::Unrecognized);
        }

        let after = manager.book().await;
        assert_eq!(before.bids, after.bids);
        assert_eq!(before.asks, after.asks);
    }

    #[tokio::test]
    async fn test_resubscribe_cycle() {
        let manager = BookManager::new(Precision::P0);
        let mut precision_rx = manager.precision_receiver();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(FeedSignal::Connected).unwrap();
        tx.send(FeedSignal::Message(SNAPSHOT.to_string())).unwrap();
        tx.send(FeedSignal::Disconnected).unwrap();
        tx.send(FeedSignal::Connected).unwrap();
        tx.send(FeedSignal::Message(
            "[17083,[[200,1,1],[199,1,1],[201,1,-1],[202,1,-1]]]".to_string(),
        ))
        .unwrap();

        let runner = Arc::new(manager);
        let run_handle = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run(rx).await })
        };

        assert!(runner.set_precision(Precision::P4).await);
        assert_eq!(*precision_rx.borrow_and_update(), Precision::P4);

        drop(tx);
        run_handle.await.unwrap();

        let state = runner.connection_state().await;
        assert_eq!(state.precision, Precision::P4);
        assert!(!state.connected);
        assert!(runner.book().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_channel_frames_ignored_after_resubscribe() {
        let manager = BookManager::new(Precision::P0);
        manager.set_connected(true).await;

        let subscribed = FeedEvent::parse(
            r#"{"event":"subscribed","channel":"book","chanId":17083,"symbol":"tBTCUSD","prec":"P0"}"#,
        )
        .unwrap();
        manager.handle_event(subscribed).await;

        // Late frames from the previous subscription
        assert_eq!(manager.handle_text(SNAPSHOT).await, ApplyOutcome::Unrecognized);
        assert_eq!(
            manager.handle_text("[17082,[98,1,5]]").await,
            ApplyOutcome::Unrecognized
        );
        assert!(manager.book().await.is_empty());

        manager
            .handle_text("[17083,[[200,1,1],[199,1,1],[201,1,-1],[202,1,-1]]]")
            .await;
        manager.handle_text("[17083,[198,1,5]]").await;

        let bids: Vec<_> = manager.view().await.bids.iter().map(|l| l.price).collect();
        assert_eq!(bids, vec![dec!(200), dec!(199), dec!(198)]);
    }

    #[tokio::test]
    async fn test_views_follow_selected_precision() {
        let manager = BookManager::new(Precision::P0);
        manager
            .handle_text("[1,[[12345.678,1,1],[12000,1,1],[13000,1,-1],[14000,1,-1]]]")
            .await;
        assert_eq!(manager.view().await.bids[0].price, dec!(12346));

        // Precision change clears the book until the next snapshot
        manager.set_precision(Precision::P2).await;
        assert!(manager.view().await.bids.is_empty());

        manager
            .handle_text("[1,[[12345.678,1,1],[12000,1,1],[13000,1,-1],[14000,1,-1]]]")
            .await;
        let view = manager.view().await;
        assert_eq!(view.precision, Precision::P2);
        assert_eq!(view.bids[0].price, dec!(12300));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_and_readers_see_consistent_book() {
        let manager = Arc::new(BookManager::new(Precision::P0));
        manager.handle_text(SNAPSHOT).await;

        let mut handles = Vec::new();
        for writer in 0..4u32 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..250u32 {
                    let price = 50 + (writer * 250 + i) % 40;
                    let text = if i % 3 == 0 {
                        format!("[1,[{},0,1]]", price)
                    } else {
                        format!("[1,[{},{},{}]]", price, i % 5 + 1, i % 7 + 1)
                    };
                    manager.handle_text(&text).await;
                }
            }));
        }

        for _ in 0..4 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    let view = manager.view().await;
                    assert!(view.bids.windows(2).all(|w| w[0].price > w[1].price));
                    assert!(view.asks.windows(2).all(|w| w[0].price < w[1].price));
                    tokio::task::yield_now().await;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let book = manager.book().await;
        assert!(book.bid_levels().all(|l| l.count > 0));
        assert_eq!(book.asks.len(), 2);
    }
}
