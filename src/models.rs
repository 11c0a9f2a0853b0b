//! Core data models for the decision engine

use crate::config::MissingFeaturePolicy;
use crate::error::EngineError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

//
// ================= Features =================
//

/// The engineered features the engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Drawdown20D,
    Volatility20D,
    VolumeAnomaly20D,
    TrendStrength50D,
}

impl Feature {
    pub const REQUIRED: [Feature; 4] = [
        Feature::Drawdown20D,
        Feature::Volatility20D,
        Feature::VolumeAnomaly20D,
        Feature::TrendStrength50D,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Drawdown20D => "Drawdown_20D",
            Feature::Volatility20D => "Volatility_20D",
            Feature::VolumeAnomaly20D => "Volume_Anomaly_20D",
            Feature::TrendStrength50D => "Trend_Strength_50D",
        }
    }
}

/// One row of feature values for a single (instrument, timestamp)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRow {
    values: BTreeMap<String, f64>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row with all four required features set
    pub fn from_values(drawdown: f64, volatility: f64, volume_anomaly: f64, trend: f64) -> Self {
        Self::new()
            .with(Feature::Drawdown20D, drawdown)
            .with(Feature::Volatility20D, volatility)
            .with(Feature::VolumeAnomaly20D, volume_anomaly)
            .with(Feature::TrendStrength50D, trend)
    }

    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.values.insert(feature.as_str().to_string(), value);
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(feature.as_str()).copied()
    }

    /// Read a feature under the given missing-value policy
    pub fn read(&self, feature: Feature, policy: MissingFeaturePolicy) -> Result<f64> {
        match (self.get(feature), policy) {
            (Some(value), _) => Ok(value),
            (None, MissingFeaturePolicy::DefaultToZero) => Ok(0.0),
            (None, MissingFeaturePolicy::Reject) => {
                Err(EngineError::MissingFeature(feature.as_str().to_string()))
            }
        }
    }

    /// Read a feature, treating absence as 0.0 regardless of policy
    pub fn read_or_zero(&self, feature: Feature) -> f64 {
        self.get(feature).unwrap_or(0.0)
    }

    /// Check every required feature is present (under `Reject`)
    pub fn ensure_complete(&self, policy: MissingFeaturePolicy) -> Result<()> {
        for feature in Feature::REQUIRED {
            self.read(feature, policy)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

//
// ================= Agent Output =================
//

/// (signal, confidence) pair produced by one agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentVerdict {
    /// Directional opinion, -1 strong sell to +1 strong buy
    pub signal: f64,
    /// Self-reported certainty, 0 to 1
    pub confidence: f64,
}

impl AgentVerdict {
    pub fn new(signal: f64, confidence: f64) -> Self {
        Self { signal, confidence }
    }
}

/// Named agent outputs in lexical agent order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentOutputs {
    outputs: BTreeMap<String, AgentVerdict>,
}

impl AgentOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, agent: impl Into<String>, verdict: AgentVerdict) {
        self.outputs.insert(agent.into(), verdict);
    }

    pub fn get(&self, agent: &str) -> Option<&AgentVerdict> {
        self.outputs.get(agent)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AgentVerdict)> {
        self.outputs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn signals(&self) -> impl Iterator<Item = f64> + '_ {
        self.outputs.values().map(|v| v.signal)
    }

    pub fn names(&self) -> Vec<&str> {
        self.outputs.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, AgentVerdict)> for AgentOutputs {
    fn from_iter<I: IntoIterator<Item = (S, AgentVerdict)>>(iter: I) -> Self {
        let mut outputs = AgentOutputs::new();
        for (name, verdict) in iter {
            outputs.insert(name, verdict);
        }
        outputs
    }
}

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegimeLabel {
    Stress,
    Volatile,
    Calm,
    Transition,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// Regime label with its fixed per-branch confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeAssessment {
    pub label: RegimeLabel,
    pub confidence: f64,
}

/// Output of the verdict gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub execution_allowed: bool,
    pub reason: String,
}

//
// ================= Verdict =================
//

/// The published record, one per instrument per evaluation.
///
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub confidence: f64,
    pub is_simulation: bool,
    pub execution_allowed: bool,
    pub consensus_score: f64,
    pub disagreement_index: f64,
    pub risk_level: RiskLevel,
    pub regime: RegimeLabel,
    pub regime_confidence: f64,
    pub reason: String,
}

impl Verdict {
    /// Check the record against the output contract
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(EngineError::InvalidVerdict(format!("{}: {}", self.ticker, msg)));

        if self.ticker.trim().is_empty() {
            return fail("empty ticker".to_string());
        }
        if !self.is_simulation {
            return fail("is_simulation must be true".to_string());
        }
        if !(-1.0..=1.0).contains(&self.consensus_score) {
            return fail(format!("consensus_score {} outside [-1, 1]", self.consensus_score));
        }
        if !(self.disagreement_index >= 0.0) {
            return fail(format!("disagreement_index {} is negative", self.disagreement_index));
        }
        for (name, value) in [
            ("confidence", self.confidence),
            ("regime_confidence", self.regime_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("{} {} outside [0, 1]", name, value));
            }
        }
        if self.execution_allowed && self.action == Action::Hold {
            return fail("HOLD cannot be executable".to_string());
        }
        if self.execution_allowed && self.risk_level != RiskLevel::Low {
            return fail(format!("execution allowed at {} risk", self.risk_level));
        }
        if self.reason.trim().is_empty() {
            return fail("empty reason".to_string());
        }
        Ok(())
    }
}

/// A verdict together with the intermediate results that explain it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub agent_outputs: AgentOutputs,
    pub fired_risk_rules: Vec<String>,
    pub decision_trace: Vec<String>,
}

/// Correctly rounded to `places` decimals, from the exact binary value
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegimeLabel::Stress => "STRESS",
            RegimeLabel::Volatile => "VOLATILE",
            RegimeLabel::Calm => "CALM",
            RegimeLabel::Transition => "TRANSITION",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        };
        write!(f, "{}", s)
    }
}
