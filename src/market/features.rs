//! Feature engineering from cleaned bars
//!
//! - `Volatility_20D`: sample std dev of the last 20 daily returns
//! - `Drawdown_20D`: close against the highest close of the last 20 bars
//! - `Volume_Anomaly_20D`: z-score of volume against the last 20 bars
//! - `Trend_Strength_50D`: close against its 50-bar simple moving average
//!
//! A row is produced only once the longest window is full.

use super::CleanBar;
use crate::models::FeatureRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const SHORT_WINDOW: usize = 20;
pub const TREND_WINDOW: usize = 50;

/// Feature row for one bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub date: NaiveDate,
    pub row: FeatureRow,
}

/// Feature rows for every bar with a full trend window, oldest first
pub fn compute_features(bars: &[CleanBar]) -> Vec<FeatureSnapshot> {
    if bars.len() < TREND_WINDOW {
        return Vec::new();
    }

    (TREND_WINDOW - 1..bars.len())
        .map(|i| snapshot_at(bars, i))
        .collect()
}

/// Feature row for the most recent bar
pub fn latest_features(bars: &[CleanBar]) -> Option<FeatureSnapshot> {
    if bars.len() < TREND_WINDOW {
        return None;
    }
    Some(snapshot_at(bars, bars.len() - 1))
}

fn snapshot_at(bars: &[CleanBar], i: usize) -> FeatureSnapshot {
    let bar = &bars[i];
    let short = &bars[i + 1 - SHORT_WINDOW..=i];
    let long = &bars[i + 1 - TREND_WINDOW..=i];

    let returns: Vec<f64> = short.iter().map(|b| b.daily_return).collect();
    let volumes: Vec<f64> = short.iter().map(|b| b.volume).collect();

    let peak = short.iter().map(|b| b.close).fold(f64::MIN, f64::max);
    let sma = mean(&long.iter().map(|b| b.close).collect::<Vec<_>>());

    let volume_std = sample_std(&volumes);
    let volume_anomaly = if volume_std > 0.0 {
        (bar.volume - mean(&volumes)) / volume_std
    } else {
        0.0
    };

    let mut row = FeatureRow::from_values(
        bar.close / peak - 1.0,
        sample_std(&returns),
        volume_anomaly,
        bar.close / sma - 1.0,
    );
    row.insert("Daily_Return", bar.daily_return);

    FeatureSnapshot {
        date: bar.date,
        row,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
