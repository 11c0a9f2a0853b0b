use market_verdict_engine::{
    config::{AppConfig, EngineConfig, MarketScope},
    engine::DecisionEngine,
    market::{PriceCache, YahooChartSource},
    simulation::Simulation,
    store::JsonFileVerdictStore,
};
use tracing::info;
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

    info!("Market Verdict Engine - simulation");

    let engine = DecisionEngine::from_config(EngineConfig::frozen())?;
    let simulation = Simulation::new(
        engine,
        PriceCache::new(&app.cache_dir),
        MarketScope::frozen(),
    );

    if app.fetch_missing {
        let source = YahooChartSource::new()?;
        let fetched = simulation.refresh_cache(&source).await?;
        info!(fetched = ?fetched, "Cache refreshed");
    }

    let store = JsonFileVerdictStore::new(&app.verdict_output);
    let verdicts = simulation.run(&store).await?;

    simulation.audit().save_to(&app.audit_output).await?;

    println!("{}", serde_json::to_string_pretty(&verdicts)?);
    info!(path = %app.verdict_output.display(), "Simulation data saved");

    Ok(())
}
