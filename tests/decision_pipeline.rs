//! End-to-end: cached bars through the engine into the JSON verdict file

use chrono::NaiveDate;
use market_verdict_engine::{
    audit::AuditLog,
    config::{default_audit_output, EngineConfig, MarketScope},
    engine::DecisionEngine,
    market::{clean, compute_features, PriceBar, PriceCache},
    simulation::Simulation,
    store::{JsonFileVerdictStore, VerdictStore},
    Action, RiskLevel,
};

/// A steady climb followed by a 25% slide over the last ten sessions
fn crash_series() -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    (0..90)
        .map(|i| {
            let close = if i < 80 {
                100.0 + i as f64 * 0.2
            } else {
                116.0 * (1.0 - 0.025 * (i - 79) as f64)
            };
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 50_000.0 + (i % 7) as f64 * 1_000.0,
            }
        })
        .collect()
}

#[test]
fn test_features_cover_history_after_warmup() {
    let bars = clean(crash_series());
    assert_eq!(bars.len(), 89);

    let snapshots = compute_features(&bars);
    assert_eq!(snapshots.len(), 89 - 49);
    assert!(snapshots.windows(2).all(|w| w[0].date < w[1].date));
}

#[tokio::test]
async fn test_crash_is_held_at_high_risk() {
    let dir = tempfile::tempdir().unwrap();
    let cache = PriceCache::new(dir.path().join("cache"));
    for ticker in MarketScope::frozen().universe {
        cache.save(&ticker, &crash_series()).await.unwrap();
    }

    let simulation = Simulation::new(
        DecisionEngine::from_config(EngineConfig::frozen()).unwrap(),
        PriceCache::new(dir.path().join("cache")),
        MarketScope::frozen(),
    );
    let store = JsonFileVerdictStore::new(dir.path().join("server").join("data.json"));

    let verdicts = simulation.run(&store).await.unwrap();
    assert_eq!(verdicts.len(), 3);

    for verdict in &verdicts {
        verdict.validate().unwrap();
        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert_eq!(verdict.action, Action::Hold);
        assert!(!verdict.execution_allowed);
    }

    let persisted = store.load_all().await.unwrap();
    assert_eq!(persisted, verdicts);

    let raw = std::fs::read_to_string(store.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let keys: Vec<&str> = json[0]
        .as_object()
        .unwrap()
        .keys()
        .map(|k| k.as_str())
        .collect();
    assert!(keys.contains(&"disagreement_index"));
    assert_eq!(json[0]["is_simulation"], true);
}

#[tokio::test]
async fn test_audit_trail_survives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let cache = PriceCache::new(dir.path().join("cache"));
    for ticker in MarketScope::frozen().universe {
        cache.save(&ticker, &crash_series()).await.unwrap();
    }

    let simulation = Simulation::new(
        DecisionEngine::from_config(EngineConfig::frozen()).unwrap(),
        cache,
        MarketScope::frozen(),
    );
    let verdict_path = dir.path().join("server").join("data.json");
    let audit_path = default_audit_output(&verdict_path);

    let verdicts = simulation
        .run(&JsonFileVerdictStore::new(&verdict_path))
        .await
        .unwrap();
    simulation.audit().save_to(&audit_path).await.unwrap();

    let reloaded = AuditLog::load_from(&audit_path).await.unwrap();
    assert_eq!(reloaded.len().await, verdicts.len());

    for verdict in &verdicts {
        let ids = reloaded.list_for_ticker(&verdict.ticker).await.unwrap();
        assert_eq!(ids.len(), 1);

        let record = reloaded.get(ids[0]).await.unwrap().unwrap();
        assert_eq!(&record.verdict, verdict);
        assert!(record.fired_risk_rules.contains(&"stress_regime".to_string()));
        assert!(reloaded.verify_integrity(ids[0]).await.unwrap());
    }
}
