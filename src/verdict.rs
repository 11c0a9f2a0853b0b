//! Final verdict gate
//!
//! HOLD whenever risk is HIGH or MEDIUM. At LOW risk the consensus score
//! decides: above the buy threshold BUY, below the sell threshold SELL,
//! otherwise HOLD.
//!
//! The sell threshold is positive (0.25), so any consensus below it sells,
//! including weakly positive scores. That is the frozen behavior and is
//! kept as is.

use crate::config::EngineConfig;
use crate::models::{Action, Decision, RiskLevel};

#[derive(Debug, Clone, Copy)]
pub struct VerdictDecider {
    buy_threshold: f64,
    sell_threshold: f64,
}

impl VerdictDecider {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            buy_threshold: config.consensus_score_buy,
            sell_threshold: config.consensus_score_sell,
        }
    }

    pub fn decide(&self, consensus_score: f64, risk_level: RiskLevel) -> Decision {
        match risk_level {
            RiskLevel::High | RiskLevel::Medium => Decision {
                action: Action::Hold,
                execution_allowed: false,
                reason: format!("Risk level {} prevents execution.", risk_level),
            },
            RiskLevel::Low if consensus_score > self.buy_threshold => Decision {
                action: Action::Buy,
                execution_allowed: true,
                reason: format!(
                    "Strong consensus ({:.2}) with LOW risk.",
                    consensus_score
                ),
            },
            RiskLevel::Low if consensus_score < self.sell_threshold => Decision {
                action: Action::Sell,
                execution_allowed: true,
                reason: format!(
                    "Weak/Negative consensus ({:.2}) with LOW risk.",
                    consensus_score
                ),
            },
            RiskLevel::Low => Decision {
                action: Action::Hold,
                execution_allowed: false,
                reason: format!("Indecisive consensus ({:.2}).", consensus_score),
            },
        }
    }
}

impl Default for VerdictDecider {
    fn default() -> Self {
        Self::new(EngineConfig::frozen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_override() {
        let decider = VerdictDecider::default();

        for risk in [RiskLevel::High, RiskLevel::Medium] {
            let decision = decider.decide(0.9, risk);
            assert_eq!(decision.action, Action::Hold);
            assert!(!decision.execution_allowed);
            assert!(decision.reason.contains(&risk.to_string()));
        }
    }

    #[test]
    fn test_low_risk_gate() {
        let decider = VerdictDecider::default();

        let cases = vec![
            (0.8, Action::Buy, true),
            (0.1, Action::Sell, true),
            (-0.6, Action::Sell, true),
            (0.5, Action::Hold, false),
            (0.75, Action::Hold, false),
            (0.25, Action::Hold, false),
        ];

        for (score, action, allowed) in cases {
            let decision = decider.decide(score, RiskLevel::Low);
            assert_eq!(decision.action, action, "score {}", score);
            assert_eq!(decision.execution_allowed, allowed, "score {}", score);
        }
    }

    #[test]
    fn test_reasons_cite_consensus() {
        let decider = VerdictDecider::default();

        assert_eq!(
            decider.decide(0.8, RiskLevel::Low).reason,
            "Strong consensus (0.80) with LOW risk."
        );
        assert_eq!(
            decider.decide(0.5, RiskLevel::Low).reason,
            "Indecisive consensus (0.50)."
        );
        assert_eq!(
            decider.decide(0.9, RiskLevel::High).reason,
            "Risk level HIGH prevents execution."
        );
    }
}
