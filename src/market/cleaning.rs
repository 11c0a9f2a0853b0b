//! Deterministic cleaning of cached bars
//!
//! Sort by date, drop rows with missing or invalid values, compute the
//! close-to-close daily return. No smoothing, no imputation.

use super::{CleanBar, PriceBar};
use tracing::debug;

pub fn clean(mut bars: Vec<PriceBar>) -> Vec<CleanBar> {
    bars.sort_by_key(|bar| bar.date);

    let raw_count = bars.len();
    let valid: Vec<PriceBar> = bars.into_iter().filter(is_valid).collect();

    // The first valid bar has no previous close and is dropped
    let cleaned: Vec<CleanBar> = valid
        .windows(2)
        .map(|pair| {
            let (prev, bar) = (&pair[0], &pair[1]);
            CleanBar {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                daily_return: bar.close / prev.close - 1.0,
            }
        })
        .collect();

    debug!(
        raw = raw_count,
        cleaned = cleaned.len(),
        "Cleaned price series"
    );

    cleaned
}

fn is_valid(bar: &PriceBar) -> bool {
    [bar.open, bar.high, bar.low, bar.close, bar.volume]
        .iter()
        .all(|v| v.is_finite())
        && bar.close > 0.0
}
