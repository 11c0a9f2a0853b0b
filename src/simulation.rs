//! Simulation runner
//!
//! CACHE → CLEAN → FEATURES → LATEST ROW → ENGINE → STORE
//!
//! Runs the decision engine once per instrument of the market scope on the
//! most recent feature row. Nothing is executed; every verdict is a
//! simulation record.

use crate::audit::AuditLog;
use crate::config::MarketScope;
use crate::engine::DecisionEngine;
use crate::error::EngineError;
use crate::market::{clean, latest_features, MarketDataSource, PriceCache};
use crate::models::Verdict;
use crate::store::VerdictStore;
use crate::Result;
use tracing::{info, warn};

pub struct Simulation {
    engine: DecisionEngine,
    cache: PriceCache,
    scope: MarketScope,
    audit: AuditLog,
}

impl Simulation {
    pub fn new(engine: DecisionEngine, cache: PriceCache, scope: MarketScope) -> Self {
        Self {
            engine,
            cache,
            scope,
            audit: AuditLog::new(),
        }
    }

    pub fn scope(&self) -> &MarketScope {
        &self.scope
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Fetch and cache every ticker not already cached. Returns the tickers fetched.
    pub async fn refresh_cache(&self, source: &dyn MarketDataSource) -> Result<Vec<String>> {
        let mut fetched = Vec::new();

        for ticker in &self.scope.universe {
            if self.cache.contains(ticker) {
                continue;
            }

            let bars = source
                .fetch_daily(ticker, self.scope.start_date, self.scope.end_date)
                .await?;

            if bars.is_empty() {
                warn!(ticker = %ticker, source = source.name(), "Source returned no bars");
                continue;
            }

            self.cache.save(ticker, &bars).await?;
            fetched.push(ticker.clone());
        }

        Ok(fetched)
    }

    /// Evaluate the latest row of every instrument and persist the verdicts
    pub async fn run(&self, store: &dyn VerdictStore) -> Result<Vec<Verdict>> {
        info!(
            universe = ?self.scope.universe,
            mode = %self.scope.execution_mode,
            "Starting simulation"
        );

        let mut verdicts = Vec::with_capacity(self.scope.universe.len());

        for ticker in &self.scope.universe {
            let bars = clean(self.cache.load(ticker).await?);
            let snapshot = latest_features(&bars).ok_or_else(|| {
                EngineError::DataError(format!(
                    "{}: {} clean bars is not enough history for features",
                    ticker,
                    bars.len()
                ))
            })?;

            let timestamp = snapshot.date.and_time(chrono::NaiveTime::MIN).and_utc();
            let evaluation = self.engine.evaluate(ticker, timestamp, &snapshot.row)?;
            let verdict = evaluation.verdict.clone();

            self.audit.record(evaluation).await?;
            verdicts.push(verdict);
        }

        store.save_all(&verdicts).await?;

        info!(count = verdicts.len(), "Simulation complete");
        Ok(verdicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::market::PriceBar;
    use crate::store::InMemoryVerdictStore;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gently rising closes with a small alternating wiggle
    fn synthetic_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        (0..count)
            .map(|i| {
                let wiggle = if i % 2 == 0 { 0.3 } else { -0.3 };
                let close = 100.0 + i as f64 * 0.1 + wiggle;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 10_000.0 + (i % 5) as f64 * 100.0,
                }
            })
            .collect()
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MarketDataSource for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_daily(
            &self,
            _ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(synthetic_bars(80))
        }
    }

    fn simulation(dir: &std::path::Path) -> Simulation {
        Simulation::new(
            DecisionEngine::from_config(EngineConfig::frozen()).unwrap(),
            PriceCache::new(dir),
            MarketScope::frozen(),
        )
    }

    #[tokio::test]
    async fn test_refresh_only_fetches_missing() {
        let dir = tempfile::tempdir().unwrap();
        let sim = simulation(dir.path());
        PriceCache::new(dir.path())
            .save("TCS.NS", &synthetic_bars(80))
            .await
            .unwrap();

        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let fetched = sim.refresh_cache(&source).await.unwrap();

        assert_eq!(fetched, vec!["RELIANCE.NS", "HDFCBANK.NS"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        sim.refresh_cache(&source).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_produces_valid_verdicts() {
        let dir = tempfile::tempdir().unwrap();
        let sim = simulation(dir.path());
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        sim.refresh_cache(&source).await.unwrap();

        let store = InMemoryVerdictStore::new();
        let verdicts = sim.run(&store).await.unwrap();

        assert_eq!(verdicts.len(), 3);
        let tickers: Vec<&str> = verdicts.iter().map(|v| v.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["RELIANCE.NS", "TCS.NS", "HDFCBANK.NS"]);

        let last_date = synthetic_bars(80).last().unwrap().date;
        for verdict in &verdicts {
            verdict.validate().unwrap();
            assert!(verdict.is_simulation);
            assert_eq!(verdict.timestamp.date_naive(), last_date);
        }

        assert_eq!(store.load_all().await.unwrap(), verdicts);
        assert_eq!(sim.audit().len().await, 3);
    }

    #[tokio::test]
    async fn test_uncached_ticker_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sim = simulation(dir.path());

        assert!(matches!(
            sim.run(&InMemoryVerdictStore::new()).await,
            Err(EngineError::DataError(_))
        ));
    }

    #[tokio::test]
    async fn test_short_history_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PriceCache::new(dir.path());
        for ticker in MarketScope::frozen().universe {
            cache.save(&ticker, &synthetic_bars(30)).await.unwrap();
        }

        let sim = simulation(dir.path());
        match sim.run(&InMemoryVerdictStore::new()).await {
            Err(EngineError::DataError(msg)) => assert!(msg.contains("not enough history")),
            other => panic!("expected data error, got {:?}", other.map(|v| v.len())),
        }
    }
}
