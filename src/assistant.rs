//! Verdict assistant
//!
//! Answers free-form questions about the market using the stored verdicts
//! as the only source of facts. The language model never influences a
//! verdict; it only explains the published ones.

use crate::models::Verdict;
use crate::store::VerdictStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Text generation backend
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub response: String,
}

const SYSTEM_PROMPT: &str = r#"You are a market analysis assistant for a simulation-only decision engine.

Guidelines:
- Answer using only the verdict records provided with the question
- Quote the action, risk level, regime and reason for the instrument asked about
- If the instrument is not covered, say so and summarise what is covered
- Every verdict is a simulation; never present it as an executed trade
- Be concise and use professional financial language"#;

pub struct VerdictAssistant {
    llm: Arc<dyn LanguageModel>,
    store: Arc<dyn VerdictStore>,
}

impl VerdictAssistant {
    pub fn new(llm: Arc<dyn LanguageModel>, store: Arc<dyn VerdictStore>) -> Self {
        Self { llm, store }
    }

    pub async fn answer(&self, question: &str) -> Result<AssistantResponse> {
        let verdicts = self.store.load_all().await?;
        let prompt = build_prompt(question, &verdicts)?;

        info!(verdicts = verdicts.len(), "Answering question");

        let response = self.llm.generate(SYSTEM_PROMPT, &prompt).await?;
        Ok(AssistantResponse { response })
    }
}

/// User prompt carrying the verdict records as JSON
pub fn build_prompt(question: &str, verdicts: &[Verdict]) -> Result<String> {
    let context = if verdicts.is_empty() {
        "No verdicts are available. The simulation has not been run yet.".to_string()
    } else {
        format!(
            "Latest verdicts:\n{}",
            serde_json::to_string_pretty(verdicts)?
        )
    };

    Ok(format!("{}\n\nQuestion: {}", context, question.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::store::tests::sample_verdict;
    use crate::store::InMemoryVerdictStore;
    use tokio::sync::Mutex;

    /// Records the prompt and answers with a canned reply
    struct MockModel {
        last_prompt: Mutex<Option<String>>,
    }

    #[async_trait::async_trait]
    impl LanguageModel for MockModel {
        async fn generate(&self, _system_prompt: &str, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().await = Some(prompt.to_string());
            Ok("HOLD: risk is HIGH.".to_string())
        }
    }

    struct FailingModel;

    #[async_trait::async_trait]
    impl LanguageModel for FailingModel {
        async fn generate(&self, _system_prompt: &str, _prompt: &str) -> Result<String> {
            Err(EngineError::LlmError("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_prompt_embeds_verdicts() {
        let prompt = build_prompt("  Should I buy TCS?  ", &[sample_verdict("TCS.NS")]).unwrap();
        assert!(prompt.contains("\"ticker\": \"TCS.NS\""));
        assert!(prompt.ends_with("Question: Should I buy TCS?"));

        let empty = build_prompt("Anything?", &[]).unwrap();
        assert!(empty.starts_with("No verdicts are available"));
    }

    #[tokio::test]
    async fn test_answer_uses_stored_verdicts() {
        let store = Arc::new(InMemoryVerdictStore::new());
        store.save_all(&[sample_verdict("RELIANCE.NS")]).await.unwrap();

        let model = Arc::new(MockModel {
            last_prompt: Mutex::new(None),
        });
        let assistant = VerdictAssistant::new(model.clone(), store);

        let answer = assistant.answer("What about Reliance?").await.unwrap();
        assert_eq!(answer.response, "HOLD: risk is HIGH.");

        let prompt = model.last_prompt.lock().await.clone().unwrap();
        assert!(prompt.contains("RELIANCE.NS"));
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        let assistant = VerdictAssistant::new(
            Arc::new(FailingModel),
            Arc::new(InMemoryVerdictStore::new()),
        );
        assert!(matches!(
            assistant.answer("hi").await,
            Err(EngineError::LlmError(_))
        ));
    }
}
