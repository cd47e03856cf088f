//! Observation ingestion loop
//!
//! Single consumer of the observation channel. Each observation runs
//! through the engine immediately; a periodic tick performs the retention
//! sweep and flushes snapshots and buffered alert transitions to the sink.
//! The engine is never locked across a database write.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Duration, Instant as TokioInstant};

use super::db::{InventorySnapshot, SnapshotSink};
use super::engine::MonitorEngine;
use super::types::{Alert, AlertDelta, Observation};

/// Run the ingestion loop until the observation channel closes.
///
/// Arguments:
/// - `rx`: receiver end of the observation channel
/// - `engine`: shared monitoring engine
/// - `sink`: optional snapshot sink; `None` disables persistence
/// - `sweep_interval_secs`: eviction + flush cadence
/// - `channel_capacity`: buffer size of the channel, for utilization logs
pub async fn start_observation_ingestion(
    mut rx: mpsc::Receiver<Observation>,
    engine: Arc<MonitorEngine>,
    sink: Option<Arc<dyn SnapshotSink>>,
    sweep_interval_secs: u64,
    channel_capacity: usize,
) {
    log::info!("🚀 Starting observation ingestion");
    log::info!("   ├─ Sweep interval: {}s", sweep_interval_secs);
    log::info!(
        "   └─ Snapshots: {}",
        if sink.is_some() { "enabled" } else { "disabled" }
    );

    // First sweep one full interval in, not at startup
    let period = Duration::from_secs(sweep_interval_secs);
    let mut sweep_timer = interval_at(TokioInstant::now() + period, period);
    let channel_capacity = channel_capacity.max(1);
    let mut observation_count = 0u64;
    let mut last_log_time = Instant::now();
    // Alert transitions since the last flush; drained into the sink
    let mut pending_alerts: Vec<Alert> = Vec::new();

    loop {
        tokio::select! {
            Some(observation) = rx.recv() => {
                let category_id = observation.category_id;
                match engine.ingest(observation) {
                    Ok(outcome) => {
                        observation_count += 1;
                        for delta in &outcome.alerts {
                            match delta {
                                AlertDelta::Created(a) => {
                                    log::warn!("🚨 [{}] {}", a.kind.as_str(), a.message);
                                }
                                AlertDelta::Resolved(a) => {
                                    log::info!("✅ resolved [{}] {}", a.kind.as_str(), a.message);
                                }
                            }
                            pending_alerts.push(delta.alert().clone());
                        }
                    }
                    Err(e) => {
                        log::warn!("⚠️  Rejected observation for category {}: {}", category_id, e);
                    }
                }

                if last_log_time.elapsed().as_secs() >= 10 {
                    let rate = observation_count as f64 / last_log_time.elapsed().as_secs_f64();
                    log::info!("📊 Ingestion rate: {:.1} obs/sec (total: {})", rate, observation_count);
                    last_log_time = Instant::now();
                    observation_count = 0;
                }
            }

            _ = sweep_timer.tick() => {
                let sweep_start = Instant::now();
                let evicted = engine.evict_sweep();

                // Snapshot state collected under the shard locks, written
                // with no lock held
                let snapshots = collect_snapshots(&engine);
                let alerts = std::mem::take(&mut pending_alerts);

                if let Some(sink) = &sink {
                    flush(sink.as_ref(), snapshots, alerts).await;
                }

                let channel_usage = rx.len();
                log::info!(
                    "📊 Sweep complete: {} evicted | channel: {}/{} | {}ms",
                    evicted,
                    channel_usage,
                    channel_capacity,
                    sweep_start.elapsed().as_millis()
                );
                if channel_usage > channel_capacity / 2 {
                    log::warn!("⚠️  Channel usage high: {}/{}", channel_usage, channel_capacity);
                }
            }

            else => {
                log::warn!("⚠️  Observation channel closed, stopping ingestion");
                if let Some(sink) = &sink {
                    let snapshots = collect_snapshots(&engine);
                    let alerts = std::mem::take(&mut pending_alerts);
                    flush(sink.as_ref(), snapshots, alerts).await;
                    log::info!("✅ Final flush complete");
                }
                break;
            }
        }
    }

    log::info!("✅ Observation ingestion stopped");
}

fn collect_snapshots(engine: &MonitorEngine) -> Vec<InventorySnapshot> {
    let recorded_at = engine.now();
    engine
        .current_states()
        .into_iter()
        .map(|state| InventorySnapshot {
            category_id: state.category_id,
            count: state.count,
            confidence: state.confidence,
            status: state.status,
            observed_at: state.observed_at,
            recorded_at,
        })
        .collect()
}

async fn flush(sink: &dyn SnapshotSink, snapshots: Vec<InventorySnapshot>, alerts: Vec<Alert>) {
    if !snapshots.is_empty() {
        let count = snapshots.len();
        match sink.write_snapshots(snapshots).await {
            Ok(()) => log::debug!("✅ Wrote {} snapshots", count),
            Err(e) => log::error!("❌ Failed to write snapshots: {}", e),
        }
    }
    if !alerts.is_empty() {
        let count = alerts.len();
        match sink.write_alerts(alerts).await {
            Ok(()) => log::debug!("✅ Wrote {} alert events", count),
            Err(e) => log::error!("❌ Failed to write alert events: {}", e),
        }
    }
}
