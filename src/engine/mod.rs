//! Decision engine - runs the full pipeline for one feature row
//!
//! ROW → REGIME → AGENTS → CONSENSUS → RISK → VERDICT
//!
//! Every stage is pure; the engine holds no mutable state and can be shared
//! across threads.

use crate::agents::create_default_registry;
use crate::classifier::RegimeClassifier;
use crate::config::EngineConfig;
use crate::consensus::ConsensusAggregator;
use crate::execution::ExecutionLayer;
use crate::models::{round_to, Evaluation, FeatureRow, Verdict};
use crate::risk::{create_default_risk_assessor, RiskAssessor};
use crate::verdict::VerdictDecider;
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Decimal places kept for consensus and disagreement in the record
const SCORE_PRECISION: usize = 4;

pub struct DecisionEngine {
    config: EngineConfig,
    classifier: RegimeClassifier,
    execution: ExecutionLayer,
    aggregator: ConsensusAggregator,
    assessor: RiskAssessor,
    decider: VerdictDecider,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig, execution: ExecutionLayer, assessor: RiskAssessor) -> Self {
        Self {
            config,
            classifier: RegimeClassifier::new(config),
            execution,
            aggregator: ConsensusAggregator::new(config),
            assessor,
            decider: VerdictDecider::new(config),
        }
    }

    /// Validate the config and wire the standard agent pool and risk rules
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let execution = ExecutionLayer::new(create_default_registry(config))?;
        let assessor = create_default_risk_assessor(config);

        info!(
            agents = ?execution.agent_names(),
            missing_features = ?config.missing_features,
            "Decision engine initialized"
        );

        Ok(Self::new(config, execution, assessor))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce the verdict for one row
    pub fn decide(&self, ticker: &str, timestamp: DateTime<Utc>, row: &FeatureRow) -> Result<Verdict> {
        Ok(self.evaluate(ticker, timestamp, row)?.verdict)
    }

    /// Produce the verdict together with the intermediate results
    pub fn evaluate(
        &self,
        ticker: &str,
        timestamp: DateTime<Utc>,
        row: &FeatureRow,
    ) -> Result<Evaluation> {
        let mut trace = Vec::new();

        row.ensure_complete(self.config.missing_features)?;
        trace.push(format!("INPUT: {} features for {}", row.len(), ticker));

        // === REGIME ===
        let regime = self.classifier.classify(row)?;
        trace.push(format!(
            "REGIME: {} (confidence {:.2})",
            regime.label, regime.confidence
        ));

        // === AGENTS ===
        let agent_outputs = self.execution.run(row)?;
        for (name, output) in agent_outputs.iter() {
            trace.push(format!(
                "AGENT {}: signal {:.4}, confidence {:.4}",
                name, output.signal, output.confidence
            ));
        }

        // === CONSENSUS ===
        let consensus = self.aggregator.consensus(&agent_outputs);
        let disagreement = self.aggregator.disagreement(&agent_outputs);
        trace.push(format!(
            "CONSENSUS: score {:.4}, disagreement {:.4}",
            consensus, disagreement
        ));

        debug!(
            ticker = ticker,
            regime = %regime.label,
            consensus = consensus,
            disagreement = disagreement,
            "Aggregation complete"
        );

        // === RISK ===
        let risk = self.assessor.evaluate(regime.label, disagreement, row);
        trace.push(if risk.fired_rules.is_empty() {
            format!("RISK: {} (no rules fired)", risk.level)
        } else {
            format!("RISK: {} ({})", risk.level, risk.fired_rules.join(", "))
        });

        // === VERDICT ===
        let decision = self.decider.decide(consensus, risk.level);
        trace.push(format!(
            "VERDICT: {} (execution {}) - {}",
            decision.action,
            if decision.execution_allowed { "allowed" } else { "blocked" },
            decision.reason
        ));

        let verdict = Verdict {
            ticker: ticker.to_string(),
            timestamp,
            action: decision.action,
            confidence: regime.confidence,
            is_simulation: true,
            execution_allowed: decision.execution_allowed,
            consensus_score: round_to(consensus, SCORE_PRECISION),
            disagreement_index: round_to(disagreement, SCORE_PRECISION),
            risk_level: risk.level,
            regime: regime.label,
            regime_confidence: regime.confidence,
            reason: decision.reason,
        };
        verdict.validate()?;

        info!(
            ticker = ticker,
            action = %verdict.action,
            risk = %verdict.risk_level,
            regime = %verdict.regime,
            execution_allowed = verdict.execution_allowed,
            "Verdict produced"
        );

        Ok(Evaluation {
            verdict,
            agent_outputs,
            fired_risk_rules: risk.fired_rules,
            decision_trace: trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingFeaturePolicy;
    use crate::error::EngineError;
    use crate::models::{Action, Feature, RegimeLabel, RiskLevel};
    use chrono::TimeZone;

    fn engine() -> DecisionEngine {
        DecisionEngine::from_config(EngineConfig::frozen()).unwrap()
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 29, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_stress_row_holds() {
        let verdict = engine()
            .decide("RELIANCE.NS", ts(), &FeatureRow::from_values(-0.2, 0.005, 2.0, 0.1))
            .unwrap();

        assert_eq!(verdict.regime, RegimeLabel::Stress);
        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert_eq!(verdict.action, Action::Hold);
        assert!(!verdict.execution_allowed);
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_calm_flat_row_sells_at_low_risk() {
        let evaluation = engine()
            .evaluate("TCS.NS", ts(), &FeatureRow::from_values(0.0, 0.005, 0.0, 0.01))
            .unwrap();
        let verdict = &evaluation.verdict;

        assert_eq!(verdict.regime, RegimeLabel::Calm);
        assert_eq!(verdict.risk_level, RiskLevel::Low);
        assert_eq!(verdict.consensus_score, 0.1659);
        assert_eq!(verdict.disagreement_index, 0.1887);
        assert_eq!(verdict.action, Action::Sell);
        assert!(verdict.execution_allowed);
        assert_eq!(verdict.reason, "Weak/Negative consensus (0.17) with LOW risk.");
        assert!(evaluation.fired_risk_rules.is_empty());
    }

    #[test]
    fn test_transition_row_is_medium_risk() {
        let evaluation = engine()
            .evaluate("HDFCBANK.NS", ts(), &FeatureRow::from_values(-0.03, 0.015, 0.3, 0.0))
            .unwrap();
        let verdict = &evaluation.verdict;

        assert_eq!(verdict.regime, RegimeLabel::Transition);
        assert_eq!(verdict.regime_confidence, 0.5);
        assert_eq!(verdict.disagreement_index, 0.2332);
        assert_eq!(verdict.risk_level, RiskLevel::Medium);
        assert_eq!(verdict.action, Action::Hold);
        assert_eq!(verdict.reason, "Risk level MEDIUM prevents execution.");
        assert_eq!(evaluation.fired_risk_rules, vec!["elevated_disagreement"]);
    }

    #[test]
    fn test_trace_covers_every_stage() {
        let evaluation = engine()
            .evaluate("TCS.NS", ts(), &FeatureRow::from_values(-0.05, 0.02, 1.2, 0.03))
            .unwrap();

        let stages = ["INPUT", "REGIME", "AGENT Macro", "CONSENSUS", "RISK", "VERDICT"];
        for stage in stages {
            assert!(
                evaluation.decision_trace.iter().any(|line| line.starts_with(stage)),
                "missing stage {}",
                stage
            );
        }
        assert_eq!(evaluation.agent_outputs.len(), 5);
    }

    #[test]
    fn test_missing_feature_policy() {
        let partial = FeatureRow::new()
            .with(Feature::Drawdown20D, -0.02)
            .with(Feature::Volatility20D, 0.005);

        assert!(matches!(
            engine().decide("TCS.NS", ts(), &partial),
            Err(EngineError::MissingFeature(_))
        ));

        let lenient = DecisionEngine::from_config(
            EngineConfig::frozen().with_missing_features(MissingFeaturePolicy::DefaultToZero),
        )
        .unwrap();
        let verdict = lenient.decide("TCS.NS", ts(), &partial).unwrap();
        assert_eq!(verdict.regime, RegimeLabel::Calm);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = EngineConfig::frozen();
        config.volatility_threshold_high = 0.0;
        assert!(matches!(
            DecisionEngine::from_config(config),
            Err(EngineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_repeated_evaluation_is_byte_identical() {
        let engine = engine();
        let row = FeatureRow::from_values(-0.07, 0.018, -1.7, -0.06);

        let first = serde_json::to_string(&engine.decide("TCS.NS", ts(), &row).unwrap()).unwrap();
        for _ in 0..10 {
            let again = serde_json::to_string(&engine.decide("TCS.NS", ts(), &row).unwrap()).unwrap();
            assert_eq!(first, again);
        }
    }
}
