//! Derived read views over the book
//!
//! Computes per-level totals, depth fractions relative to the largest level on
//! each side, and significant-digit rounding for display:
//! - `total = |amount| * price`
//! - `depth_fraction = |amount| / max(|amount|)` per side
//! - price, amount and total rounded to the precision's significant digits

use crate::orderbook::types::{BookView, LevelView, OrderBook, PriceLevel, Precision, Side};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest decimal scale `rust_decimal` can represent
const MAX_SCALE: u32 = 28;

/// Round `value` to the number of significant digits implied by `precision`
///
/// Significant-digit rounding, not decimal places: `12345.678` at `P2`
/// (3 digits) becomes `12300`. Ties round away from zero and trailing zeros
/// are dropped from the result.
pub fn format_significant_digits(value: Decimal, precision: Precision) -> Decimal {
    round_significant(value, precision.significant_digits())
}

/// Round `value` to `digits` significant digits
pub fn round_significant(value: Decimal, digits: u32) -> Decimal {
    if value.is_zero() || digits == 0 {
        return Decimal::ZERO;
    }

    // Position of the leading digit relative to the decimal point
    let exponent = leading_exponent(value);
    let keep = digits as i64 - 1 - exponent;

    let rounded = if keep >= 0 {
        let dp = keep.min(MAX_SCALE as i64) as u32;
        value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    } else {
        let factor = pow10(keep.unsigned_abs() as u32);
        let scaled = value / factor;

        // Rounding up next to Decimal::MAX would overflow; truncate instead
        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(factor)
            .or_else(|| {
                scaled
                    .round_dp_with_strategy(0, RoundingStrategy::ToZero)
                    .checked_mul(factor)
            })
            .unwrap_or(value)
    };

    rounded.normalize()
}

/// Base-10 exponent of the most significant digit (`12345.6` → 4, `0.00123` → -3)
fn leading_exponent(value: Decimal) -> i64 {
    let digits = value.mantissa().unsigned_abs().to_string().len() as i64;
    digits - 1 - value.scale() as i64
}

fn pow10(exp: u32) -> Decimal {
    Decimal::from_i128_with_scale(10i128.pow(exp.min(MAX_SCALE)), 0)
}

/// Build the display view of the whole book at the given precision
pub fn derive_view(order_book: &OrderBook, precision: Precision) -> BookView {
    derive_view_depth(order_book, precision, usize::MAX)
}

/// Build the display view limited to the top `depth` levels per side
///
/// Depth fractions are relative to the largest level among those shown.
pub fn derive_view_depth(order_book: &OrderBook, precision: Precision, depth: usize) -> BookView {
    let bids: Vec<&PriceLevel> = order_book.levels(Side::Bid).take(depth).collect();
    let asks: Vec<&PriceLevel> = order_book.levels(Side::Ask).take(depth).collect();

    BookView {
        precision,
        bids: side_view(&bids, precision),
        asks: side_view(&asks, precision),
        timestamp: order_book.timestamp,
    }
}

/// Largest quantity magnitude on a side, `None` when the side is empty
pub fn max_amount<'a>(levels: impl IntoIterator<Item = &'a PriceLevel>) -> Option<Decimal> {
    levels.into_iter().map(|level| level.amount.abs()).max()
}

/// Quantity of `level` relative to `max`, 0.0 for a zero maximum
pub fn depth_fraction(level: &PriceLevel, max: Decimal) -> f64 {
    if max.is_zero() {
        return 0.0;
    }

    (level.amount.abs() / max).to_f64().unwrap_or(0.0)
}

fn side_view(levels: &[&PriceLevel], precision: Precision) -> Vec<LevelView> {
    let Some(max) = max_amount(levels.iter().copied()) else {
        return Vec::new();
    };

    levels
        .iter()
        .map(|level| LevelView {
            price: format_significant_digits(level.price, precision),
            count: level.count,
            amount: format_significant_digits(level.amount.abs(), precision),
            total: format_significant_digits(level.total(), precision),
            depth_fraction: depth_fraction(level, max),
        })
        .collect()
}
