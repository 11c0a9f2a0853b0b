//! Risk agent: downside read from drawdown, never bullish.

use super::{volatility_confidence, Agent};
use crate::config::EngineConfig;
use crate::models::{AgentVerdict, Feature, FeatureRow};
use crate::Result;

pub struct RiskAgent {
    config: EngineConfig,
}

impl RiskAgent {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Linear map from drawdown onto [-1, 0]: 0 at no drawdown, -1 at the limit
    fn drawdown_signal(&self, drawdown: f64) -> f64 {
        let limit = self.config.max_drawdown_limit;

        if drawdown <= limit {
            -1.0
        } else if drawdown >= 0.0 {
            0.0
        } else {
            (-(drawdown / limit)).clamp(-1.0, 0.0)
        }
    }
}

impl Agent for RiskAgent {
    fn name(&self) -> &'static str {
        "Risk"
    }

    fn description(&self) -> &'static str {
        "Conservative drawdown penalty, signal restricted to [-1, 0]"
    }

    fn evaluate(&self, row: &FeatureRow) -> Result<AgentVerdict> {
        let policy = self.config.missing_features;
        let drawdown = row.read(Feature::Drawdown20D, policy)?;
        let volatility = row.read(Feature::Volatility20D, policy)?;

        Ok(AgentVerdict::new(
            self.drawdown_signal(drawdown),
            volatility_confidence(volatility, &self.config),
        ))
    }
}
