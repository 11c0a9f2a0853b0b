//! Macro agent: broad market context from the regime alone.

use super::Agent;
use crate::classifier::RegimeClassifier;
use crate::config::EngineConfig;
use crate::models::{AgentVerdict, FeatureRow, RegimeLabel};
use crate::Result;

pub struct MacroAgent {
    classifier: RegimeClassifier,
}

impl MacroAgent {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            classifier: RegimeClassifier::new(config),
        }
    }
}

impl Agent for MacroAgent {
    fn name(&self) -> &'static str {
        "Macro"
    }

    fn description(&self) -> &'static str {
        "Regime-driven market context"
    }

    fn evaluate(&self, row: &FeatureRow) -> Result<AgentVerdict> {
        let regime = self.classifier.classify(row)?;

        let (signal, confidence) = match regime.label {
            RegimeLabel::Stress => (-1.0, 0.9),
            RegimeLabel::Volatile => (-0.5, 0.6),
            RegimeLabel::Calm => (0.5, 0.8),
            RegimeLabel::Transition => (0.0, 0.4),
        };

        Ok(AgentVerdict::new(signal, confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_table() {
        let agent = MacroAgent::new(EngineConfig::frozen());

        let cases = vec![
            (-0.30, 0.005, -1.0, 0.9),
            (-0.02, 0.040, -0.5, 0.6),
            (-0.02, 0.005, 0.5, 0.8),
            (-0.02, 0.015, 0.0, 0.4),
        ];

        for (drawdown, volatility, signal, confidence) in cases {
            let row = FeatureRow::from_values(drawdown, volatility, 0.0, 0.0);
            let out = agent.evaluate(&row).unwrap();
            assert_eq!(out, AgentVerdict::new(signal, confidence));
        }
    }
}
