mod config;
pub mod monitor;

use {
    config::Config,
    monitor::{
        config::MonitorConfig,
        db::{SnapshotSink, SqliteSnapshotSink},
        engine::MonitorEngine,
        ingestion::start_observation_ingestion,
        query::Queries,
        registry::{CategoryRegistry, CategorySpec},
        types::Observation,
    },
    std::sync::Arc,
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        sync::mpsc,
    },
};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    // Write logs to stderr so the final report on stdout stays parseable
    let mut builder = if config.rust_log.is_some() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    } else {
        env_logger::Builder::from_default_env()
    };
    builder.target(env_logger::Target::Stderr).init();

    let monitor_config = MonitorConfig::from_env();

    log::info!("🚀 Starting shelfwatch...");
    log::info!("📊 Configuration:");
    log::info!(
        "   Retention: {}h | Trend window: {}h",
        monitor_config.retention_hours,
        monitor_config.trend_window_hours
    );
    log::info!(
        "   Thresholds (default): low={} critical={}",
        monitor_config.default_low_threshold,
        monitor_config.default_critical_threshold
    );
    log::info!(
        "   Lead time: {}h | Restock-soon horizon: {}h",
        monitor_config.lead_time_hours,
        monitor_config.restock_soon_hours
    );

    let registry = match &config.categories_path {
        Some(path) => {
            log::info!("   Categories: loading from {}", path);
            CategoryRegistry::load_file(
                path,
                monitor_config.default_low_threshold,
                monitor_config.default_critical_threshold,
            )?
        }
        None => {
            log::info!("   Categories: none configured, seeding demo set");
            demo_registry(&monitor_config)?
        }
    };
    log::info!("   {} categories registered", registry.len());

    let sink: Option<Arc<dyn SnapshotSink>> = if config.snapshots_enabled {
        log::info!("   Snapshots: {}", config.db_path);
        Some(Arc::new(SqliteSnapshotSink::open(&config.db_path)?))
    } else {
        None
    };

    let engine = Arc::new(MonitorEngine::new(registry, monitor_config));
    let (tx, rx) = mpsc::channel::<Observation>(config.channel_buffer);

    // Observation feed: one JSON object per stdin line. The sender drops
    // on EOF, which closes the channel and ends the ingestion loop.
    let reader_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Observation>(line) {
                        Ok(observation) => {
                            if tx.send(observation).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => log::warn!("⚠️  Skipping malformed observation: {}", e),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("❌ Feed read error: {}", e);
                    break;
                }
            }
        }
    });

    start_observation_ingestion(
        rx,
        engine.clone(),
        sink,
        config.sweep_interval_secs,
        config.channel_buffer,
    )
    .await;
    let _ = reader_handle.await;

    // Feed ended: emit the final projections for whoever piped us the feed
    let queries = Queries::new(engine);
    let report = serde_json::json!({
        "categories": queries.categories(),
        "inventory": queries.current(),
        "trends": queries.trends(24),
        "alerts": queries.alerts(false),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Demo category set matching the detector_sim feed
fn demo_registry(config: &MonitorConfig) -> Result<CategoryRegistry, monitor::MonitorError> {
    let specs = ["Dairy", "Produce", "Beverages", "Bakery", "Frozen"]
        .iter()
        .enumerate()
        .map(|(i, name)| CategorySpec {
            id: Some(i as i64 + 1),
            name: name.to_string(),
            description: None,
            low_stock_threshold: None,
            critical_threshold: None,
        })
        .collect();
    CategoryRegistry::from_specs(
        specs,
        config.default_low_threshold,
        config.default_critical_threshold,
    )
}
