//! Execution layer for the agent pool
//!
//! Runs every registered agent on one feature row in lexical order and
//! checks each output against the agent contract. No aggregation here.

use crate::agents::{AgentRegistry, MANDATED_AGENTS};
use crate::error::EngineError;
use crate::models::{AgentOutputs, AgentVerdict, FeatureRow};
use crate::Result;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Executes the fixed five-agent pool deterministically
pub struct ExecutionLayer {
    registry: AgentRegistry,
}

impl ExecutionLayer {
    /// Build the layer, refusing any registry that is not exactly the mandated pool
    pub fn new(registry: AgentRegistry) -> Result<Self> {
        let registered: BTreeSet<&str> = registry.list().into_iter().collect();
        let mandated: BTreeSet<&str> = MANDATED_AGENTS.iter().copied().collect();

        if registered != mandated {
            let missing: Vec<&str> = mandated.difference(&registered).copied().collect();
            let unexpected: Vec<&str> = registered.difference(&mandated).copied().collect();

            return Err(EngineError::ArchitectureError(format!(
                "Agent pool must be exactly {:?}; missing {:?}, unexpected {:?}",
                MANDATED_AGENTS, missing, unexpected
            )));
        }

        Ok(Self { registry })
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.registry.list()
    }

    /// Run all agents on a row (fail-fast on the first contract violation)
    pub fn run(&self, row: &FeatureRow) -> Result<AgentOutputs> {
        let mut outputs = AgentOutputs::new();

        for (name, agent) in self.registry.iter() {
            let verdict = agent.evaluate(row)?;

            if let Err(e) = check_contract(name, &verdict) {
                warn!(agent = name, error = %e, "Agent broke its output contract");
                return Err(e);
            }

            debug!(
                agent = name,
                signal = verdict.signal,
                confidence = verdict.confidence,
                "Agent evaluated"
            );

            outputs.insert(name, verdict);
        }

        ensure_complete(outputs)
    }
}

/// Exactly the mandated agents must have reported
pub(crate) fn ensure_complete(outputs: AgentOutputs) -> Result<AgentOutputs> {
    let missing = MANDATED_AGENTS
        .iter()
        .filter(|name| outputs.get(name).is_none())
        .count();

    if missing > 0 || outputs.len() != MANDATED_AGENTS.len() {
        return Err(EngineError::IncompleteExecution {
            expected: MANDATED_AGENTS.len(),
            collected: outputs.len(),
        });
    }

    Ok(outputs)
}

/// signal ∈ [-1, 1], confidence ∈ [0, 1]; NaN fails both
pub fn check_contract(agent: &str, verdict: &AgentVerdict) -> Result<()> {
    if !(-1.0..=1.0).contains(&verdict.signal) {
        return Err(EngineError::ContractViolation {
            agent: agent.to_string(),
            field: "signal",
            value: verdict.signal,
        });
    }

    if !(0.0..=1.0).contains(&verdict.confidence) {
        return Err(EngineError::ContractViolation {
            agent: agent.to_string(),
            field: "confidence",
            value: verdict.confidence,
        });
    }

    Ok(())
}
