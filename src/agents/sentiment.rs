//! Sentiment agent
//!
//! Uses volume anomaly and trend as a sentiment proxy: heavy volume
//! confirms the direction of the trend. Under a STRESS regime the agent may
//! not be bullish and its confidence is capped.

use super::Agent;
use crate::classifier::RegimeClassifier;
use crate::config::EngineConfig;
use crate::models::{AgentVerdict, Feature, FeatureRow, RegimeLabel};
use crate::Result;

/// |z| above this is significant volume
const SIGNIFICANT_ANOMALY: f64 = 1.0;
const VOLUME_CONFIRMATION: f64 = 0.8;
const TREND_BIAS: f64 = 5.0;
/// z = 3 is full confidence
const ANOMALY_FOR_FULL_CONFIDENCE: f64 = 3.0;
const STRESS_CONFIDENCE_CAP: f64 = 0.5;

pub struct SentimentAgent {
    config: EngineConfig,
    classifier: RegimeClassifier,
}

impl SentimentAgent {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            classifier: RegimeClassifier::new(config),
        }
    }
}

impl Agent for SentimentAgent {
    fn name(&self) -> &'static str {
        "Sentiment"
    }

    fn description(&self) -> &'static str {
        "Volume-confirmed trend sentiment, muted under market stress"
    }

    fn evaluate(&self, row: &FeatureRow) -> Result<AgentVerdict> {
        let policy = self.config.missing_features;
        let anomaly = row.read(Feature::VolumeAnomaly20D, policy)?;
        let trend = row.read(Feature::TrendStrength50D, policy)?;

        let base = if anomaly.abs() > SIGNIFICANT_ANOMALY {
            if trend > 0.0 {
                VOLUME_CONFIRMATION
            } else {
                -VOLUME_CONFIRMATION
            }
        } else {
            0.0
        };

        let mut signal = (base + trend * TREND_BIAS).clamp(-1.0, 1.0);
        let mut confidence = (anomaly.abs() / ANOMALY_FOR_FULL_CONFIDENCE).min(1.0);

        let regime = self.classifier.classify(row)?;
        if regime.label == RegimeLabel::Stress {
            signal = signal.min(0.0);
            confidence = confidence.min(STRESS_CONFIDENCE_CAP);
        }

        Ok(AgentVerdict::new(signal, confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(drawdown: f64, anomaly: f64, trend: f64) -> AgentVerdict {
        let row = FeatureRow::from_values(drawdown, 0.015, anomaly, trend);
        SentimentAgent::new(EngineConfig::frozen()).evaluate(&row).unwrap()
    }

    #[test]
    fn test_volume_confirms_uptrend() {
        let out = evaluate(-0.02, 1.5, 0.02);
        assert!((out.signal - 0.9).abs() < 1e-12);
        assert!((out.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_volume_with_flat_trend_is_bearish() {
        let out = evaluate(-0.02, -2.0, 0.0);
        assert!((out.signal + 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_quiet_volume_follows_trend_only() {
        let out = evaluate(-0.02, 0.5, -0.04);
        assert!((out.signal + 0.2).abs() < 1e-12);
        assert!((out.confidence - 0.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_saturates() {
        assert_eq!(evaluate(-0.02, 7.0, 0.01).confidence, 1.0);
    }

    #[test]
    fn test_stress_override() {
        let out = evaluate(-0.25, 4.0, 0.1);
        assert_eq!(out.signal, 0.0);
        assert_eq!(out.confidence, 0.5);
    }
}
