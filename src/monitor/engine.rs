//! Ingestion coordinator and shared monitor state
//!
//! The engine owns one shard per category: its time-series partition, its
//! current state, and its alert log. A shard is the unit of mutual
//! exclusion — every mutation for a category runs under that shard's lock,
//! and different categories never contend. The shard map itself is only
//! locked for lookup and creation. No lock is ever held across I/O or an
//! await point; everything under a shard lock is pure in-memory work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};

use super::alerts::AlertLog;
use super::config::MonitorConfig;
use super::error::MonitorError;
use super::registry::CategoryRegistry;
use super::store::CategorySeries;
use super::trend::compute_trend;
use super::types::{
    Alert, AlertDelta, CategoryId, CurrentState, Observation, TimeSeriesPoint, TrendResult,
};

/// Per-category state owned by exactly one shard lock
struct CategoryShard {
    series: CategorySeries,
    current: Option<CurrentState>,
    alerts: AlertLog,
}

impl CategoryShard {
    fn new() -> Self {
        Self {
            series: CategorySeries::new(),
            current: None,
            alerts: AlertLog::new(),
        }
    }
}

/// Everything one `ingest` call produced: the replacement state, the fresh
/// trend, and the alert transitions it triggered.
#[derive(Debug)]
pub struct IngestOutcome {
    pub state: CurrentState,
    pub trend: TrendResult,
    pub alerts: Vec<AlertDelta>,
}

/// The monitoring engine: category registry, per-category shards, and the
/// alert-id routing table.
pub struct MonitorEngine {
    registry: CategoryRegistry,
    config: MonitorConfig,
    shards: RwLock<HashMap<CategoryId, Arc<Mutex<CategoryShard>>>>,
    /// alert id -> owning category, for O(1) resolve routing
    alert_routes: RwLock<HashMap<u64, CategoryId>>,
    next_alert_id: AtomicU64,
    /// Timestamp function (for testing with mock time)
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl MonitorEngine {
    pub fn new(registry: CategoryRegistry, config: MonitorConfig) -> Self {
        Self::with_clock(registry, config, Box::new(Utc::now))
    }

    /// Engine with a custom timestamp function, for deterministic tests.
    pub fn with_clock(
        registry: CategoryRegistry,
        config: MonitorConfig,
        now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    ) -> Self {
        Self {
            registry,
            config,
            shards: RwLock::new(HashMap::new()),
            alert_routes: RwLock::new(HashMap::new()),
            next_alert_id: AtomicU64::new(1),
            now_fn,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.now_fn)()
    }

    fn shard(&self, id: CategoryId) -> Arc<Mutex<CategoryShard>> {
        if let Some(shard) = self.shards.read().unwrap().get(&id) {
            return shard.clone();
        }
        let mut shards = self.shards.write().unwrap();
        shards
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(CategoryShard::new())))
            .clone()
    }

    fn existing_shard(&self, id: CategoryId) -> Option<Arc<Mutex<CategoryShard>>> {
        self.shards.read().unwrap().get(&id).cloned()
    }

    /// Ingest one observation.
    ///
    /// Atomic per category: append to the series, replace current state,
    /// recompute the trend, and run the alert machine under a single shard
    /// lock. Fails before any mutation on an unknown category or an
    /// invalid observation. Calls for different categories proceed in
    /// parallel.
    pub fn ingest(&self, observation: Observation) -> Result<IngestOutcome, MonitorError> {
        observation
            .validate()
            .map_err(MonitorError::InvalidObservation)?;
        let category = self
            .registry
            .get(observation.category_id)
            .ok_or(MonitorError::UnknownCategory(observation.category_id))?;

        let now = self.now();
        let point = TimeSeriesPoint {
            count: observation.count,
            confidence: observation.confidence,
            observed_at: observation.observed_at.unwrap_or(now),
        };

        let shard = self.shard(category.id);
        let mut guard = shard.lock().unwrap();
        let shard = &mut *guard;

        shard.series.append(point);
        // Lazy eviction on the hot path; the periodic sweep covers idle
        // categories
        shard
            .series
            .evict_older_than(now - Duration::hours(self.config.retention_hours));

        let latest = *shard
            .series
            .latest()
            .expect("series is non-empty after append");
        let state = CurrentState::from_point(&category, &latest);
        shard.current = Some(state.clone());

        let window = shard
            .series
            .window(now, Duration::hours(self.config.trend_window_hours));
        let trend = compute_trend(category.id, window, self.config.lead_time_hours, now);

        let deltas = shard.alerts.evaluate(
            &category,
            &state,
            &trend,
            self.config.restock_soon_hours,
            now,
            || self.next_alert_id.fetch_add(1, Ordering::SeqCst),
        );

        if !deltas.is_empty() {
            let mut routes = self.alert_routes.write().unwrap();
            for delta in &deltas {
                if let AlertDelta::Created(alert) = delta {
                    routes.insert(alert.id, category.id);
                }
            }
        }

        Ok(IngestOutcome {
            state,
            trend,
            alerts: deltas,
        })
    }

    /// Explicitly resolve an alert by id.
    ///
    /// Idempotent on already-resolved ids; `NotFound` on unknown ids. If
    /// the underlying condition still holds, the next ingestion for that
    /// category opens a fresh alert.
    pub fn resolve_alert(&self, alert_id: u64) -> Result<Alert, MonitorError> {
        let category_id = {
            let routes = self.alert_routes.read().unwrap();
            routes.get(&alert_id).copied()
        }
        .ok_or_else(|| MonitorError::NotFound(format!("alert {}", alert_id)))?;

        let now = self.now();
        let shard = self.shard(category_id);
        let mut guard = shard.lock().unwrap();
        guard
            .alerts
            .resolve(alert_id, now)
            .ok_or_else(|| MonitorError::NotFound(format!("alert {}", alert_id)))
    }

    /// Retention sweep across all categories. Shards are taken one at a
    /// time, so in-flight ingestion on other categories is never blocked.
    /// Returns the number of evicted points.
    pub fn evict_sweep(&self) -> usize {
        let now = self.now();
        let horizon = now - Duration::hours(self.config.retention_hours);
        let shards: Vec<_> = self.shards.read().unwrap().values().cloned().collect();

        let mut evicted = 0;
        for shard in shards {
            let mut guard = shard.lock().unwrap();
            let before = guard.series.len();
            guard.series.evict_older_than(horizon);
            evicted += before - guard.series.len();
        }
        evicted
    }

    /// Current state per category, ordered by category id. Categories with
    /// no observations yet are omitted.
    pub fn current_states(&self) -> Vec<CurrentState> {
        let mut states = Vec::new();
        for category in self.registry.list() {
            if let Some(shard) = self.existing_shard(category.id) {
                if let Some(state) = shard.lock().unwrap().current.clone() {
                    states.push(state);
                }
            }
        }
        states
    }

    /// Time-series points for one category (or all), chronological.
    pub fn history(
        &self,
        category_id: Option<CategoryId>,
        duration: Duration,
    ) -> Result<Vec<(CategoryId, TimeSeriesPoint)>, MonitorError> {
        let categories = match category_id {
            Some(id) => {
                let category = self
                    .registry
                    .get(id)
                    .ok_or(MonitorError::UnknownCategory(id))?;
                vec![category]
            }
            None => self.registry.list(),
        };

        let now = self.now();
        let mut points = Vec::new();
        for category in categories {
            if let Some(shard) = self.existing_shard(category.id) {
                let guard = shard.lock().unwrap();
                points.extend(
                    guard
                        .series
                        .window(now, duration)
                        .iter()
                        .map(|p| (category.id, *p)),
                );
            }
        }
        // Stable sort keeps per-category arrival order on equal timestamps
        points.sort_by_key(|(_, p)| p.observed_at);
        Ok(points)
    }

    /// Fresh trend for every category with at least one observation.
    pub fn trends(&self, duration: Duration) -> Vec<TrendResult> {
        let now = self.now();
        let mut trends = Vec::new();
        for category in self.registry.list() {
            if let Some(shard) = self.existing_shard(category.id) {
                let guard = shard.lock().unwrap();
                if guard.series.is_empty() {
                    continue;
                }
                let window = guard.series.window(now, duration);
                trends.push(compute_trend(
                    category.id,
                    window,
                    self.config.lead_time_hours,
                    now,
                ));
            }
        }
        trends
    }

    /// Every alert record across all categories, unordered.
    pub fn alerts_snapshot(&self) -> Vec<Alert> {
        let shards: Vec<_> = self.shards.read().unwrap().values().cloned().collect();
        let mut alerts = Vec::new();
        for shard in shards {
            alerts.extend(shard.lock().unwrap().alerts.all().iter().cloned());
        }
        alerts
    }
}
