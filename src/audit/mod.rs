//! Audit trail for engine evaluations
//!
//! Every evaluation can be recorded with the intermediate results that
//! produced it. Records carry a hash of the verdict so tampering is
//! detectable. The log is written next to the verdict file after a run and
//! read back by the API.

use crate::models::{AgentOutputs, Evaluation, Verdict};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// One recorded evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub audit_id: Uuid,
    pub verdict: Verdict,
    pub agent_outputs: AgentOutputs,
    pub fired_risk_rules: Vec<String>,
    pub decision_trace: Vec<String>,
    pub verdict_hash: String,
    pub recorded_at: DateTime<Utc>,
}

impl EvaluationRecord {
    pub fn from_evaluation(evaluation: Evaluation) -> Result<Self> {
        let verdict_hash = compute_verdict_hash(&evaluation.verdict)?;
        Ok(Self {
            audit_id: Uuid::new_v4(),
            verdict: evaluation.verdict,
            agent_outputs: evaluation.agent_outputs,
            fired_risk_rules: evaluation.fired_risk_rules,
            decision_trace: evaluation.decision_trace,
            verdict_hash,
            recorded_at: Utc::now(),
        })
    }
}

/// Audit trail storage
pub struct AuditLog {
    records: Arc<RwLock<HashMap<Uuid, EvaluationRecord>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store an evaluation, returning its audit ID
    pub async fn record(&self, evaluation: Evaluation) -> Result<Uuid> {
        let record = EvaluationRecord::from_evaluation(evaluation)?;
        let audit_id = record.audit_id;
        let mut records = self.records.write().await;
        records.insert(audit_id, record);
        Ok(audit_id)
    }

    pub async fn get(&self, audit_id: Uuid) -> Result<Option<EvaluationRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&audit_id).cloned())
    }

    /// Audit IDs for a ticker, oldest first
    pub async fn list_for_ticker(&self, ticker: &str) -> Result<Vec<Uuid>> {
        let records = self.records.read().await;

        let mut items: Vec<_> = records
            .values()
            .filter(|record| record.verdict.ticker.eq_ignore_ascii_case(ticker))
            .map(|record| (record.audit_id, record.recorded_at))
            .collect();

        items.sort_by_key(|(_, recorded_at)| *recorded_at);

        Ok(items.into_iter().map(|(id, _)| id).collect())
    }

    /// Recompute the verdict hash; unknown IDs are not intact
    pub async fn verify_integrity(&self, audit_id: Uuid) -> Result<bool> {
        let records = self.records.read().await;

        match records.get(&audit_id) {
            Some(record) => Ok(compute_verdict_hash(&record.verdict)? == record.verdict_hash),
            None => Ok(false),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All records, oldest first
    pub async fn records(&self) -> Vec<EvaluationRecord> {
        let records = self.records.read().await;
        let mut all: Vec<EvaluationRecord> = records.values().cloned().collect();
        all.sort_by_key(|record| record.recorded_at);
        all
    }

    /// Write every record as a pretty JSON array
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let records = self.records().await;
        tokio::fs::write(path, serde_json::to_string_pretty(&records)?).await?;

        info!(count = records.len(), path = %path.display(), "Audit trail saved");
        Ok(())
    }

    /// Rebuild a log from a saved file; an absent file is an empty log.
    ///
    /// Stored hashes are kept as written so `verify_integrity` can detect
    /// edits made to the file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let log = Self::new();
        if !path.is_file() {
            return Ok(log);
        }

        let bytes = tokio::fs::read(path).await?;
        let saved: Vec<EvaluationRecord> = serde_json::from_slice(&bytes)?;
        {
            let mut records = log.records.write().await;
            for record in saved {
                records.insert(record.audit_id, record);
            }
        }
        Ok(log)
    }

    #[cfg(test)]
    async fn tamper(&self, audit_id: Uuid, edit: impl FnOnce(&mut Verdict)) {
        if let Some(record) = self.records.write().await.get_mut(&audit_id) {
            edit(&mut record.verdict);
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA256 of the verdict's JSON form, streamed straight into the hasher
pub fn compute_verdict_hash(verdict: &Verdict) -> Result<String> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(HashWriter(&mut hasher), verdict)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Lets serde_json write into a digest
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<H: Digest> Write for HashWriter<'_, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
