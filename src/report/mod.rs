// Ladder rendering for terminal output
//
// Turns a derived book view into a markdown ladder: bids on the left
// (Count | Amount | Total | Price), asks on the right (Price | Total | Amount |
// Count), each row carrying a bar proportional to its depth fraction.

pub mod formatter;

use crate::orderbook::types::{BookView, LevelView};
use chrono::{TimeZone, Utc};
use formatter::{build_section_header, build_table, depth_bar};

/// Default width of depth bars in characters
pub const DEFAULT_BAR_WIDTH: usize = 12;

/// Column headers of the ladder table
pub const LADDER_HEADERS: [&str; 10] = [
    "Bid depth", "Count", "Amount", "Total", "Price", "Price", "Total", "Amount", "Count",
    "Ask depth",
];

/// Render a book view as a markdown ladder
pub fn render_ladder(view: &BookView, title: &str, bar_width: usize) -> String {
    let mut out = build_section_header(
        &format!("{} ({})", title, view.precision),
        2,
    );

    let updated = Utc
        .timestamp_millis_opt(view.timestamp)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    out.push_str(&format!("Updated: {}\n\n", updated));

    if view.bids.is_empty() && view.asks.is_empty() {
        out.push_str("[Waiting for snapshot]\n");
        return out;
    }

    let depth = view.bids.len().max(view.asks.len());
    let rows: Vec<Vec<String>> = (0..depth)
        .map(|i| {
            let mut row = bid_cells(view.bids.get(i), bar_width);
            row.extend(ask_cells(view.asks.get(i), bar_width));
            row
        })
        .collect();

    out.push_str(&build_table(&LADDER_HEADERS, &rows));
    out
}

fn bid_cells(level: Option<&LevelView>, bar_width: usize) -> Vec<String> {
    match level {
        Some(level) => vec![
            depth_bar(level.depth_fraction, bar_width, true),
            level.count.to_string(),
            level.amount.to_string(),
            level.total.to_string(),
            level.price.to_string(),
        ],
        None => vec![String::new(); 5],
    }
}

fn ask_cells(level: Option<&LevelView>, bar_width: usize) -> Vec<String> {
    match level {
        Some(level) => vec![
            level.price.to_string(),
            level.total.to_string(),
            level.amount.to_string(),
            level.count.to_string(),
            depth_bar(level.depth_fraction, bar_width, false),
        ],
        None => vec![String::new(); 5],
    }
}
