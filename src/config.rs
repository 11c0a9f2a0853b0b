//! Frozen engine configuration and operational settings
//!
//! `EngineConfig` holds every decision threshold. It is built once at
//! process start, validated, and handed to each component explicitly.
//! `AppConfig` only carries operational settings (paths, ports, keys) and
//! never influences a verdict.

use crate::error::EngineError;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

//
// ================= Frozen Thresholds =================
//

/// Daily return std dev above 2.5% is volatile
pub const VOLATILITY_THRESHOLD_HIGH: f64 = 0.025;
/// Daily return std dev below 1.0% is calm
pub const VOLATILITY_THRESHOLD_LOW: f64 = 0.010;
/// Drawdown deeper than -15% is stress
pub const MAX_DRAWDOWN_LIMIT: f64 = -0.15;
pub const CONSENSUS_SCORE_BUY: f64 = 0.75;
pub const CONSENSUS_SCORE_SELL: f64 = 0.25;
pub const DISAGREEMENT_THRESHOLD: f64 = 0.40;
/// Carried for completeness; the verdict gate does not consult it.
pub const MIN_CONFIDENCE_LEVEL: f64 = 0.80;

/// What to do when a required feature is absent from a row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingFeaturePolicy {
    /// Fail the evaluation with `MissingFeature`
    Reject,
    /// Read the feature as 0.0
    DefaultToZero,
}

/// Base aggregation weight per agent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AgentWeights {
    pub structure: f64,
    pub risk: f64,
    pub sentiment: f64,
    pub macro_regime: f64,
    pub skeptic: f64,
}

impl AgentWeights {
    /// Weight for an agent name; unknown names weigh 1.0
    pub fn for_agent(&self, name: &str) -> f64 {
        match name {
            "Structure" => self.structure,
            "Risk" => self.risk,
            "Sentiment" => self.sentiment,
            "Macro" => self.macro_regime,
            "Skeptic" => self.skeptic,
            _ => 1.0,
        }
    }

    fn all(&self) -> [(&'static str, f64); 5] {
        [
            ("Structure", self.structure),
            ("Risk", self.risk),
            ("Sentiment", self.sentiment),
            ("Macro", self.macro_regime),
            ("Skeptic", self.skeptic),
        ]
    }
}

impl Default for AgentWeights {
    fn default() -> Self {
        Self {
            structure: 1.0,
            risk: 2.0,
            sentiment: 0.5,
            macro_regime: 1.5,
            skeptic: 1.0,
        }
    }
}

/// Immutable thresholds consumed by the decision engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub volatility_threshold_high: f64,
    pub volatility_threshold_low: f64,
    pub max_drawdown_limit: f64,
    pub consensus_score_buy: f64,
    pub consensus_score_sell: f64,
    pub disagreement_threshold: f64,
    pub min_confidence_level: f64,
    pub agent_weights: AgentWeights,
    pub missing_features: MissingFeaturePolicy,
}

impl EngineConfig {
    /// The frozen production thresholds
    pub fn frozen() -> Self {
        Self {
            volatility_threshold_high: VOLATILITY_THRESHOLD_HIGH,
            volatility_threshold_low: VOLATILITY_THRESHOLD_LOW,
            max_drawdown_limit: MAX_DRAWDOWN_LIMIT,
            consensus_score_buy: CONSENSUS_SCORE_BUY,
            consensus_score_sell: CONSENSUS_SCORE_SELL,
            disagreement_threshold: DISAGREEMENT_THRESHOLD,
            min_confidence_level: MIN_CONFIDENCE_LEVEL,
            agent_weights: AgentWeights::default(),
            missing_features: MissingFeaturePolicy::Reject,
        }
    }

    pub fn with_missing_features(mut self, policy: MissingFeaturePolicy) -> Self {
        self.missing_features = policy;
        self
    }

    /// Reject threshold sets the decision rules cannot work with
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("volatility_threshold_high", self.volatility_threshold_high),
            ("volatility_threshold_low", self.volatility_threshold_low),
            ("max_drawdown_limit", self.max_drawdown_limit),
            ("consensus_score_buy", self.consensus_score_buy),
            ("consensus_score_sell", self.consensus_score_sell),
            ("disagreement_threshold", self.disagreement_threshold),
            ("min_confidence_level", self.min_confidence_level),
        ];

        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EngineError::ConfigError(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }

        // Volatility ratios divide by the high threshold
        if self.volatility_threshold_high <= 0.0 {
            return Err(EngineError::ConfigError(
                "volatility_threshold_high must be positive".to_string(),
            ));
        }

        if self.volatility_threshold_low < 0.0
            || self.volatility_threshold_low >= self.volatility_threshold_high
        {
            return Err(EngineError::ConfigError(format!(
                "volatility_threshold_low ({}) must be in [0, {})",
                self.volatility_threshold_low, self.volatility_threshold_high
            )));
        }

        // Risk agent divides by the drawdown limit
        if self.max_drawdown_limit >= 0.0 {
            return Err(EngineError::ConfigError(format!(
                "max_drawdown_limit must be negative, got {}",
                self.max_drawdown_limit
            )));
        }

        if self.disagreement_threshold < 0.0 {
            return Err(EngineError::ConfigError(
                "disagreement_threshold must not be negative".to_string(),
            ));
        }

        for (agent, weight) in self.agent_weights.all() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::ConfigError(format!(
                    "weight for {} must be a non-negative number, got {}",
                    agent, weight
                )));
            }
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::frozen()
    }
}

//
// ================= Market Scope =================
//

/// The fixed instrument universe and data window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketScope {
    pub universe: Vec<String>,
    pub exchange: String,
    pub timeframe: String,
    pub execution_mode: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl MarketScope {
    pub fn frozen() -> Self {
        Self {
            universe: vec![
                "RELIANCE.NS".to_string(),
                "TCS.NS".to_string(),
                "HDFCBANK.NS".to_string(),
            ],
            exchange: "NSE".to_string(),
            timeframe: "1D".to_string(),
            execution_mode: "SIMULATION".to_string(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

impl Default for MarketScope {
    fn default() -> Self {
        Self::frozen()
    }
}

//
// ================= Operational Settings =================
//

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub cache_dir: PathBuf,
    pub verdict_output: PathBuf,
    pub audit_output: PathBuf,
    pub api_port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub fetch_missing: bool,
}

impl AppConfig {
    /// Read operational settings from the environment (call `dotenv` first)
    pub fn from_env() -> Result<Self> {
        let api_port = env::var("PORT")
            .or_else(|_| env::var("API_PORT"))
            .unwrap_or_else(|_| "5000".to_string());
        let api_port = api_port.parse::<u16>().map_err(|e| {
            EngineError::ConfigError(format!("Invalid port '{}': {}", api_port, e))
        })?;

        let fetch_missing = match env::var("FETCH_MISSING") {
            Ok(v) => !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"),
            Err(_) => true,
        };

        let verdict_output: PathBuf = env::var("VERDICT_OUTPUT")
            .unwrap_or_else(|_| "server/data.json".to_string())
            .into();
        let audit_output = env::var("AUDIT_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_audit_output(&verdict_output));

        Ok(Self {
            cache_dir: env::var("CACHE_DIR")
                .unwrap_or_else(|_| "data/cache".to_string())
                .into(),
            verdict_output,
            audit_output,
            api_port,
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            fetch_missing,
        })
    }
}

/// `audit.json` beside the verdict file
pub fn default_audit_output(verdict_output: &Path) -> PathBuf {
    verdict_output.with_file_name("audit.json")
}
