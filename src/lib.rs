//! Market Verdict Engine
//!
//! A deterministic, simulation-only decision engine that:
//! - Classifies the market regime from engineered price features
//! - Runs a fixed pool of five independent rule-based agents
//! - Aggregates their opinions into consensus and disagreement scores
//! - Applies rules-based risk assessment with safety overrides
//! - Publishes one explainable BUY / SELL / HOLD verdict per instrument
//!
//! PIPELINE:
//! ROW → REGIME → AGENTS → CONSENSUS → RISK → VERDICT

pub mod agents;
pub mod api;
pub mod assistant;
pub mod audit;
pub mod classifier;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod error;
pub mod execution;
pub mod gemini;
pub mod market;
pub mod models;
pub mod risk;
pub mod simulation;
pub mod store;
pub mod verdict;

pub use error::{EngineError, Result};

// Re-export common types
pub use config::{EngineConfig, MissingFeaturePolicy};
pub use engine::DecisionEngine;
pub use models::*;
