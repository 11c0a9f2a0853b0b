//! Market Regime Classifier
//!
//! Priority-ordered, first match wins:
//! - STRESS: drawdown deeper than the drawdown limit
//! - VOLATILE: volatility above the high threshold
//! - CALM: volatility below the low threshold
//! - TRANSITION: everything else
//!
//! Confidence is fixed per branch, not derived from the data.

use crate::config::EngineConfig;
use crate::models::{Feature, FeatureRow, RegimeAssessment, RegimeLabel};
use crate::Result;

const DECISIVE_CONFIDENCE: f64 = 1.0;
const TRANSITION_CONFIDENCE: f64 = 0.5;

/// Regime classifier
#[derive(Debug, Clone, Copy)]
pub struct RegimeClassifier {
    config: EngineConfig,
}

impl RegimeClassifier {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Classify the regime of a single feature row
    pub fn classify(&self, row: &FeatureRow) -> Result<RegimeAssessment> {
        let policy = self.config.missing_features;
        let drawdown = row.read(Feature::Drawdown20D, policy)?;
        let volatility = row.read(Feature::Volatility20D, policy)?;

        Ok(self.classify_values(drawdown, volatility))
    }

    /// Classification on raw values; comparisons are strict
    pub fn classify_values(&self, drawdown: f64, volatility: f64) -> RegimeAssessment {
        let (label, confidence) = if drawdown < self.config.max_drawdown_limit {
            (RegimeLabel::Stress, DECISIVE_CONFIDENCE)
        } else if volatility > self.config.volatility_threshold_high {
            (RegimeLabel::Volatile, DECISIVE_CONFIDENCE)
        } else if volatility < self.config.volatility_threshold_low {
            (RegimeLabel::Calm, DECISIVE_CONFIDENCE)
        } else {
            (RegimeLabel::Transition, TRANSITION_CONFIDENCE)
        };

        RegimeAssessment { label, confidence }
    }
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        Self::new(EngineConfig::frozen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingFeaturePolicy;
    use crate::error::EngineError;

    fn row(drawdown: f64, volatility: f64) -> FeatureRow {
        FeatureRow::new()
            .with(Feature::Drawdown20D, drawdown)
            .with(Feature::Volatility20D, volatility)
    }

    #[test]
    fn test_stress_has_priority() {
        let classifier = RegimeClassifier::default();

        for volatility in [0.0, 0.005, 0.015, 0.025, 0.08] {
            let regime = classifier.classify(&row(-0.20, volatility)).unwrap();
            assert_eq!(regime.label, RegimeLabel::Stress);
            assert_eq!(regime.confidence, 1.0);
        }
    }

    #[test]
    fn test_each_branch() {
        let classifier = RegimeClassifier::default();

        let cases = vec![
            (-0.02, 0.030, RegimeLabel::Volatile, 1.0),
            (-0.02, 0.005, RegimeLabel::Calm, 1.0),
            (-0.02, 0.015, RegimeLabel::Transition, 0.5),
        ];

        for (drawdown, volatility, label, confidence) in cases {
            let regime = classifier.classify(&row(drawdown, volatility)).unwrap();
            assert_eq!(regime.label, label);
            assert_eq!(regime.confidence, confidence);
        }
    }

    #[test]
    fn test_boundaries_are_strict() {
        let classifier = RegimeClassifier::default();

        // Exactly at the high threshold is not volatile
        let at_high = classifier.classify(&row(0.0, 0.025)).unwrap();
        assert_eq!(at_high.label, RegimeLabel::Transition);

        // Exactly at the low threshold is not calm
        let at_low = classifier.classify(&row(0.0, 0.010)).unwrap();
        assert_eq!(at_low.label, RegimeLabel::Transition);

        // Exactly at the drawdown limit is not stress
        let at_limit = classifier.classify(&row(-0.15, 0.005)).unwrap();
        assert_eq!(at_limit.label, RegimeLabel::Calm);
    }

    #[test]
    fn test_missing_feature() {
        let classifier = RegimeClassifier::default();
        let partial = FeatureRow::new().with(Feature::Volatility20D, 0.03);

        assert!(matches!(
            classifier.classify(&partial),
            Err(EngineError::MissingFeature(_))
        ));

        let lenient = RegimeClassifier::new(
            EngineConfig::frozen().with_missing_features(MissingFeaturePolicy::DefaultToZero),
        );
        let regime = lenient.classify(&FeatureRow::new()).unwrap();
        assert_eq!(regime.label, RegimeLabel::Calm);
    }
}
