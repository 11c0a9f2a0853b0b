//! Market data collaborators
//!
//! Everything upstream of the decision engine: acquiring daily bars,
//! caching them locally, cleaning them and deriving the feature rows the
//! engine consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod cleaning;
pub mod features;
pub mod source;

pub use cache::PriceCache;
pub use cleaning::clean;
pub use features::{compute_features, latest_features, FeatureSnapshot};
pub use source::{MarketDataSource, YahooChartSource};

/// One daily OHLCV candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A cleaned candle with its simple daily return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub daily_return: f64,
}
