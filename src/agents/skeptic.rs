//! Skeptic agent
//!
//! Challenges bullish readings. Volatility pushes it negative, strong
//! uptrends are doubted, downtrends are agreed with. The signal is capped
//! at +0.2 so it is never strongly bullish.

use super::Agent;
use crate::config::EngineConfig;
use crate::models::{AgentVerdict, Feature, FeatureRow};
use crate::Result;

const SIGNAL_CAP: f64 = 0.2;
const BASE_CONFIDENCE: f64 = 0.5;
const STRONG_TREND: f64 = 0.05;

pub struct SkepticAgent {
    config: EngineConfig,
}

impl SkepticAgent {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Agent for SkepticAgent {
    fn name(&self) -> &'static str {
        "Skeptic"
    }

    fn description(&self) -> &'static str {
        "Contrarian check biased against bullish interpretations"
    }

    fn evaluate(&self, row: &FeatureRow) -> Result<AgentVerdict> {
        let policy = self.config.missing_features;
        let volatility = row.read(Feature::Volatility20D, policy)?;
        let trend = row.read(Feature::TrendStrength50D, policy)?;

        let mut signal = 0.0;
        let mut confidence = BASE_CONFIDENCE;

        if volatility > self.config.volatility_threshold_low {
            signal -= volatility / self.config.volatility_threshold_high;
        }

        if trend > STRONG_TREND {
            signal -= 0.1;
        } else if trend < -STRONG_TREND {
            signal -= 0.5;
            confidence += 0.2;
        }

        Ok(AgentVerdict::new(
            signal.clamp(-1.0, SIGNAL_CAP),
            confidence.clamp(0.0, 1.0),
        ))
    }
}
