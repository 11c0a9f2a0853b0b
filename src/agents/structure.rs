//! Structure agent: price structure from trend and volatility.
//!
//! Signal grows with trend strength (a 10% deviation saturates it);
//! confidence decays with volatility.

use super::{volatility_confidence, Agent};
use crate::config::EngineConfig;
use crate::models::{AgentVerdict, Feature, FeatureRow};
use crate::Result;

/// Trend deviation of 0.10 maps to a full signal
const TREND_SCALE: f64 = 10.0;

pub struct StructureAgent {
    config: EngineConfig,
}

impl StructureAgent {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Agent for StructureAgent {
    fn name(&self) -> &'static str {
        "Structure"
    }

    fn description(&self) -> &'static str {
        "Trend-following read of price structure, discounted by volatility"
    }

    fn evaluate(&self, row: &FeatureRow) -> Result<AgentVerdict> {
        let policy = self.config.missing_features;
        let trend = row.read(Feature::TrendStrength50D, policy)?;
        let volatility = row.read(Feature::Volatility20D, policy)?;

        let signal = (trend * TREND_SCALE).clamp(-1.0, 1.0);
        let confidence = volatility_confidence(volatility, &self.config);

        Ok(AgentVerdict::new(signal, confidence))
    }
}
