//! Agent trait and registry
//!
//! Agents are deterministic, side-effect-free scoring rules. Each one maps a
//! feature row to a (signal, confidence) pair and never sees another
//! agent's output.

use crate::config::EngineConfig;
use crate::models::{AgentVerdict, FeatureRow};
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod macro_regime;
pub mod risk;
pub mod sentiment;
pub mod skeptic;
pub mod structure;

pub use macro_regime::MacroAgent;
pub use risk::RiskAgent;
pub use sentiment::SentimentAgent;
pub use skeptic::SkepticAgent;
pub use structure::StructureAgent;

/// The exact agent set a deployment must run, in lexical order
pub const MANDATED_AGENTS: [&str; 5] = ["Macro", "Risk", "Sentiment", "Skeptic", "Structure"];

/// Trait for a single scoring agent
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn evaluate(&self, row: &FeatureRow) -> Result<AgentVerdict>;
}

/// Agent registry keyed by name, iterated in lexical order
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: BTreeMap::new(),
        }
    }

    /// Register an agent, replacing any agent with the same name
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        self.agents.insert(agent.name().to_string(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.agents.keys().map(|s| s.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Agent>)> {
        self.agents.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the registry of the five mandated agents
pub fn create_default_registry(config: EngineConfig) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(StructureAgent::new(config)));
    registry.register(Arc::new(RiskAgent::new(config)));
    registry.register(Arc::new(SentimentAgent::new(config)));
    registry.register(Arc::new(MacroAgent::new(config)));
    registry.register(Arc::new(SkepticAgent::new(config)));
    registry
}

/// Confidence decays linearly to zero at the high volatility threshold
pub(crate) fn volatility_confidence(volatility: f64, config: &EngineConfig) -> f64 {
    (1.0 - volatility / config.volatility_threshold_high).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_matches_mandate() {
        let registry = create_default_registry(EngineConfig::frozen());
        assert_eq!(registry.list(), MANDATED_AGENTS.to_vec());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let config = EngineConfig::frozen();
        let mut registry = create_default_registry(config);
        registry.register(Arc::new(StructureAgent::new(config)));
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_every_agent_honours_contract() {
        let registry = create_default_registry(EngineConfig::frozen());

        let drawdowns = [-0.5, -0.2, -0.15, -0.1, -0.03, 0.0, 0.05];
        let volatilities = [0.0, 0.005, 0.01, 0.02, 0.025, 0.06, 0.2];
        let anomalies = [-6.0, -1.5, -0.5, 0.0, 1.0, 2.5, 9.0];
        let trends = [-0.6, -0.1, -0.05, 0.0, 0.04, 0.2, 0.8];

        for dd in drawdowns {
            for vol in volatilities {
                for anomaly in anomalies {
                    for trend in trends {
                        let row = FeatureRow::from_values(dd, vol, anomaly, trend);
                        for (name, agent) in registry.iter() {
                            let out = agent.evaluate(&row).unwrap();
                            assert!(
                                (-1.0..=1.0).contains(&out.signal),
                                "{} signal {} for {:?}",
                                name,
                                out.signal,
                                row
                            );
                            assert!(
                                (0.0..=1.0).contains(&out.confidence),
                                "{} confidence {} for {:?}",
                                name,
                                out.confidence,
                                row
                            );
                        }
                    }
                }
            }
        }
    }
}
