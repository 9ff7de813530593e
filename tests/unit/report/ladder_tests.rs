// Unit tests for ladder rendering from a live engine

use bitfinex_book::orderbook::*;
use bitfinex_book::report::{render_ladder, LADDER_HEADERS};

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> OrderBookEngine {
        let mut engine = OrderBookEngine::new();
        engine.apply_snapshot(
            vec![
                PriceLevel::new(dec!(27000), 2, dec!(0.5)),
                PriceLevel::new(dec!(26999.5), 1, dec!(1)),
            ],
            vec![
                PriceLevel::new(dec!(27001), 3, dec!(-0.25)),
                PriceLevel::new(dec!(27002.5), 1, dec!(-0.125)),
            ],
        );
        engine
    }

    fn cells(line: &str) -> Vec<&str> {
        let inner = line.trim_start_matches('|').trim_end_matches('|');
        inner.split('|').map(str::trim).collect()
    }

    #[test]
    fn test_ladder_headers() {
        let out = render_ladder(&engine().derived_view(Precision::P0), "tBTCUSD", 4);
        let header = out.lines().find(|l| l.starts_with('|')).unwrap();
        assert_eq!(cells(header), LADDER_HEADERS);
    }

    #[test]
    fn test_ladder_columns_aligned() {
        let out = render_ladder(&engine().derived_view(Precision::P2), "tBTCUSD", 6);
        let lines: Vec<&str> = out.lines().filter(|l| l.starts_with('|')).collect();
        let width = lines[0].chars().count();

        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.chars().count() == width));
    }

    #[test]
    fn test_ladder_rows_in_book_order() {
        let out = render_ladder(&engine().derived_view(Precision::P0), "tBTCUSD", 4);
        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with('|')).skip(2).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            cells(rows[0]),
            ["██", "2", "0.5", "13500", "27000", "27001", "6750.3", "0.25", "3", "████"]
        );
        assert_eq!(
            cells(rows[1]),
            ["████", "1", "1", "27000", "27000", "27003", "3375.3", "0.125", "1", "██"]
        );
    }

    #[test]
    fn test_ladder_depth_limit() {
        let view = engine().derived_view_depth(Precision::P1, 1);
        let out = render_ladder(&view, "tBTCUSD", 4);
        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with('|')).skip(2).collect();

        assert!(out.starts_with("## tBTCUSD (P1)\n\n"));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_cleared_book_waits_for_snapshot() {
        let mut engine = engine();
        engine.clear();

        let out = render_ladder(&engine.derived_view(Precision::P0), "tETHUSD", 4);
        assert!(out.contains("[Waiting for snapshot]"));
        assert!(!out.contains("| Count |"));
    }
}
