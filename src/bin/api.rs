use market_verdict_engine::{
    api::{start_server, ApiState},
    assistant::VerdictAssistant,
    config::AppConfig,
    gemini::GeminiClient,
    store::{JsonFileVerdictStore, VerdictStore},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();
    let app = AppConfig::from_env()?;

    info!("Market Verdict Engine - API Server");
    info!("Port: {}", app.api_port);

    let store: Arc<dyn VerdictStore> = Arc::new(JsonFileVerdictStore::new(&app.verdict_output));

    let assistant = match &app.gemini_api_key {
        Some(key) => {
            let llm = GeminiClient::new(key.clone(), app.gemini_model.clone())?;
            Some(Arc::new(VerdictAssistant::new(Arc::new(llm), store.clone())))
        }
        None => {
            warn!("GEMINI_API_KEY not set; /api/chat will be unavailable");
            None
        }
    };

    let state = ApiState {
        store,
        assistant,
        audit_path: app.audit_output.clone(),
    };

    start_server(state, app.api_port).await?;

    Ok(())
}
