//! Risk assessment engine
//!
//! Rules-based, deterministic. Every rule that fires escalates the risk
//! level to its own severity; the assessed level is the maximum. Since all
//! HIGH rules outrank all MEDIUM rules this is the same as checking them in
//! priority order and stopping at the first match.

use crate::config::EngineConfig;
use crate::models::{Feature, FeatureRow, RegimeLabel, RiskLevel};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Inputs every risk rule sees
pub struct RiskContext<'a> {
    pub regime: RegimeLabel,
    pub disagreement: f64,
    pub row: &'a FeatureRow,
}

/// Trait for risk rules
pub trait RiskRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Level this rule escalates to when it fires
    fn risk_level(&self) -> RiskLevel;

    fn fires(&self, context: &RiskContext<'_>) -> bool;
}

/// Outcome of an assessment with the rules that fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub fired_rules: Vec<String>,
}

/// Risk assessor that applies its rules in priority order
pub struct RiskAssessor {
    rules: Vec<Box<dyn RiskRule>>,
}

impl RiskAssessor {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn RiskRule>) {
        self.rules.push(rule);
    }

    /// Assessed risk level
    pub fn assess(&self, regime: RegimeLabel, disagreement: f64, row: &FeatureRow) -> RiskLevel {
        self.evaluate(regime, disagreement, row).level
    }

    /// Assess and report which rules fired
    pub fn evaluate(
        &self,
        regime: RegimeLabel,
        disagreement: f64,
        row: &FeatureRow,
    ) -> RiskAssessment {
        let context = RiskContext {
            regime,
            disagreement,
            row,
        };

        let mut level = RiskLevel::Low;
        let mut fired_rules = Vec::new();

        for rule in &self.rules {
            if rule.fires(&context) {
                fired_rules.push(rule.name().to_string());
                level = std::cmp::max(level, rule.risk_level());
            }
        }

        debug!(
            regime = %regime,
            disagreement = disagreement,
            level = %level,
            fired = ?fired_rules,
            "Risk assessed"
        );

        RiskAssessment { level, fired_rules }
    }
}

impl Default for RiskAssessor {
    fn default() -> Self {
        Self::new()
    }
}

//
// ================= RiskLevel Ordering =================
//

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl RiskLevel {
    fn rank(&self) -> u8 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }
}

//
// ================= Rules =================
//

/// HIGH: the market is in a STRESS regime
pub struct StressRegimeRule;

impl RiskRule for StressRegimeRule {
    fn name(&self) -> &'static str {
        "stress_regime"
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::High
    }

    fn fires(&self, context: &RiskContext<'_>) -> bool {
        context.regime == RegimeLabel::Stress
    }
}

/// Agents disagree more than `threshold`
pub struct DisagreementRule {
    name: &'static str,
    threshold: f64,
    level: RiskLevel,
}

impl RiskRule for DisagreementRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn risk_level(&self) -> RiskLevel {
        self.level
    }

    fn fires(&self, context: &RiskContext<'_>) -> bool {
        context.disagreement > self.threshold
    }
}

/// HIGH: drawdown beyond the limit.
///
/// Duplicates the STRESS regime check as a safety net. A missing drawdown
/// reads as 0.0 and never fires.
pub struct DrawdownBreachRule {
    limit: f64,
}

impl RiskRule for DrawdownBreachRule {
    fn name(&self) -> &'static str {
        "drawdown_breach"
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::High
    }

    fn fires(&self, context: &RiskContext<'_>) -> bool {
        context.row.read_or_zero(Feature::Drawdown20D) < self.limit
    }
}

/// MEDIUM: the market is VOLATILE
pub struct VolatileRegimeRule;

impl RiskRule for VolatileRegimeRule {
    fn name(&self) -> &'static str {
        "volatile_regime"
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Medium
    }

    fn fires(&self, context: &RiskContext<'_>) -> bool {
        context.regime == RegimeLabel::Volatile
    }
}

/// Create the standard assessor from the frozen thresholds
pub fn create_default_risk_assessor(config: EngineConfig) -> RiskAssessor {
    let mut assessor = RiskAssessor::new();
    assessor.add_rule(Box::new(StressRegimeRule));
    assessor.add_rule(Box::new(DisagreementRule {
        name: "high_disagreement",
        threshold: config.disagreement_threshold,
        level: RiskLevel::High,
    }));
    assessor.add_rule(Box::new(DrawdownBreachRule {
        limit: config.max_drawdown_limit,
    }));
    assessor.add_rule(Box::new(VolatileRegimeRule));
    assessor.add_rule(Box::new(DisagreementRule {
        name: "elevated_disagreement",
        threshold: config.disagreement_threshold * 0.5,
        level: RiskLevel::Medium,
    }));
    assessor
}

//
// ================= Tests =================
//
