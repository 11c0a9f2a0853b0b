//! Consensus & Disagreement
//!
//! Consensus is the confidence-weighted mean of agent signals, with each
//! agent's weight scaled by its frozen base weight. Disagreement is the
//! population standard deviation of the raw signals. For signals in
//! [-1, 1] it is bounded by 1.0 (an even split between -1 and +1), so no
//! renormalisation is applied.

use crate::config::{AgentWeights, EngineConfig};
use crate::models::AgentOutputs;

#[derive(Debug, Clone, Copy)]
pub struct ConsensusAggregator {
    weights: AgentWeights,
}

impl ConsensusAggregator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            weights: config.agent_weights,
        }
    }

    /// Weighted consensus score in [-1, 1]; 0.0 when every weight is zero
    pub fn consensus(&self, outputs: &AgentOutputs) -> f64 {
        let (weighted_sum, total_weight) = outputs
            .iter()
            .fold((0.0, 0.0), |(sum, total), (name, verdict)| {
                let weight = self.weights.for_agent(name) * verdict.confidence;
                (sum + verdict.signal * weight, total + weight)
            });

        if total_weight == 0.0 {
            return 0.0;
        }

        (weighted_sum / total_weight).clamp(-1.0, 1.0)
    }

    /// Population standard deviation of the unweighted signals
    pub fn disagreement(&self, outputs: &AgentOutputs) -> f64 {
        let signals: Vec<f64> = outputs.signals().collect();
        population_std(&signals)
    }
}

impl Default for ConsensusAggregator {
    fn default() -> Self {
        Self::new(EngineConfig::frozen())
    }
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
