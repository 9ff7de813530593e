// Unit tests for book maintenance over long update sequences

use bitfinex_book::orderbook::{OrderBookEngine, PriceLevel, Side, UpdateOutcome};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Deterministic linear congruential generator for reproducible sequences
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// Random update: price in 90.0..=110.0, count 0..=3, signed amount or zero
fn random_update(rng: &mut Lcg) -> (Decimal, u32, Decimal) {
    let price = Decimal::new(900 + rng.below(201) as i64, 1);
    let count = rng.below(4) as u32;
    let magnitude = Decimal::new(1 + rng.below(5000) as i64, 3);
    let amount = match rng.below(5) {
        0 => Decimal::ZERO,
        1 | 2 => magnitude,
        _ => -magnitude,
    };
    (price, count, amount)
}

fn assert_invariants(engine: &OrderBookEngine) {
    let bids: Vec<Decimal> = engine.book().bid_levels().map(|l| l.price).collect();
    let asks: Vec<Decimal> = engine.book().ask_levels().map(|l| l.price).collect();

    assert!(bids.windows(2).all(|w| w[0] > w[1]), "bids not descending: {bids:?}");
    assert!(asks.windows(2).all(|w| w[0] < w[1]), "asks not ascending: {asks:?}");

    for (price, level) in engine.book().bids.iter().chain(engine.book().asks.iter()) {
        assert_eq!(*price, level.price);
        assert!(level.count > 0);
        assert!(level.amount > Decimal::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_remove_insert_scenario() {
        let mut engine = OrderBookEngine::new();
        engine.apply_snapshot(
            vec![
                PriceLevel::new(dec!(100), 1, dec!(2)),
                PriceLevel::new(dec!(99), 1, dec!(3)),
            ],
            vec![
                PriceLevel::new(dec!(101), 1, dec!(-1)),
                PriceLevel::new(dec!(102), 1, dec!(-2)),
            ],
        );

        engine.apply_update(dec!(100), 0, dec!(2));
        engine.apply_update(dec!(98), 1, dec!(5));

        let bids: Vec<_> = engine.book().bid_levels().copied().collect();
        assert_eq!(
            bids,
            vec![
                PriceLevel::new(dec!(99), 1, dec!(3)),
                PriceLevel::new(dec!(98), 1, dec!(5)),
            ]
        );
        let asks: Vec<_> = engine.book().ask_levels().map(|l| l.price).collect();
        assert_eq!(asks, vec![dec!(101), dec!(102)]);
    }

    #[test]
    fn test_random_sequence_matches_reference_model() {
        let mut rng = Lcg(0x5eed);
        let mut engine = OrderBookEngine::new();
        let mut model: HashMap<(Side, Decimal), (u32, Decimal)> = HashMap::new();

        for step in 0..5000 {
            let (price, count, amount) = random_update(&mut rng);
            engine.apply_update(price, count, amount);

            match Side::from_amount(amount) {
                None => {
                    model.remove(&(Side::Bid, price));
                    model.remove(&(Side::Ask, price));
                }
                Some(side) if count == 0 => {
                    model.remove(&(side, price));
                }
                Some(side) => {
                    model.insert((side, price), (count, amount.abs()));
                }
            }

            assert_invariants(&engine);
            assert_eq!(
                engine.book().bids.len() + engine.book().asks.len(),
                model.len(),
                "size mismatch at step {step}"
            );
        }

        for ((side, price), (count, amount)) in &model {
            let stored = match side {
                Side::Bid => engine.book().bids.get(price),
                Side::Ask => engine.book().asks.get(price),
            };
            assert_eq!(stored, Some(&PriceLevel::new(*price, *count, *amount)));
        }
    }

    #[test]
    fn test_removal_twice_equals_once() {
        let mut rng = Lcg(42);

        for _ in 0..200 {
            let mut base = OrderBookEngine::new();
            for _ in 0..50 {
                let (price, count, amount) = random_update(&mut rng);
                base.apply_update(price, count, amount);
            }

            let (price, _, amount) = random_update(&mut rng);
            let mut once = base.clone();
            let mut twice = base.clone();

            once.apply_update(price, 0, amount);
            twice.apply_update(price, 0, amount);
            let second = twice.apply_update(price, 0, amount);

            assert_eq!(once.book().bids, twice.book().bids);
            assert_eq!(once.book().asks, twice.book().asks);
            assert_eq!(second, UpdateOutcome::Ignored);
        }
    }

    #[test]
    fn test_snapshot_replaces_any_prior_state() {
        let mut rng = Lcg(7);
        let mut engine = OrderBookEngine::new();
        for _ in 0..500 {
            let (price, count, amount) = random_update(&mut rng);
            engine.apply_update(price, count, amount);
        }

        let bids = vec![
            PriceLevel::new(dec!(10), 1, dec!(1)),
            PriceLevel::new(dec!(12), 2, dec!(2)),
            PriceLevel::new(dec!(11), 3, dec!(3)),
        ];
        let asks = vec![PriceLevel::new(dec!(13), 1, dec!(-4))];
        engine.apply_snapshot(bids, asks);

        let bid_prices: Vec<_> = engine.book().bid_levels().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![dec!(12), dec!(11), dec!(10)]);
        assert_eq!(
            engine.book().ask_levels().copied().collect::<Vec<_>>(),
            vec![PriceLevel::new(dec!(13), 1, dec!(4))]
        );
    }
}
