//! Read-only query façade
//!
//! Projections over the engine's stores for the external API layer. Pure
//! reads: nothing here mutates state, and every row carries an explicit
//! timestamp so the consumer decides freshness.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::engine::MonitorEngine;
use super::error::MonitorError;
use super::types::{CategoryId, RestockSuggestion, StockStatus};

/// One row of the current-inventory projection
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRow {
    pub id: CategoryId,
    pub category: String,
    pub count: u32,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub low_stock_threshold: u32,
    pub status: StockStatus,
}

/// One row of the history projection, chronological
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRow {
    pub category: String,
    pub count: u32,
    pub timestamp: DateTime<Utc>,
}

/// One row of the depletion-trend projection
#[derive(Debug, Clone, Serialize)]
pub struct TrendRow {
    pub category: String,
    pub depletion_rate: f64,
    pub current_count: u32,
    pub hours_until_empty: Option<f64>,
    pub suggested_restock: Option<RestockSuggestion>,
}

/// One row of the alerts projection, newest first
#[derive(Debug, Clone, Serialize)]
pub struct AlertRow {
    pub id: u64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    pub count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Read-only projections over a shared engine.
#[derive(Clone)]
pub struct Queries {
    engine: Arc<MonitorEngine>,
}

impl Queries {
    pub fn new(engine: Arc<MonitorEngine>) -> Self {
        Self { engine }
    }

    fn category_name(&self, id: CategoryId) -> String {
        self.engine
            .registry()
            .get(id)
            .map(|c| c.name)
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Registered categories, ordered by id.
    pub fn categories(&self) -> Vec<super::registry::Category> {
        self.engine.registry().list()
    }

    /// Latest count, confidence, and status per category, ordered by
    /// category id.
    pub fn current(&self) -> Vec<InventoryRow> {
        self.engine
            .current_states()
            .into_iter()
            .map(|state| {
                let category = self
                    .engine
                    .registry()
                    .get(state.category_id)
                    .expect("current state only exists for registered categories");
                InventoryRow {
                    id: category.id,
                    category: category.name,
                    count: state.count,
                    confidence: state.confidence,
                    timestamp: state.observed_at,
                    low_stock_threshold: category.low_stock_threshold,
                    status: state.status,
                }
            })
            .collect()
    }

    /// Observations in the last `hours`, oldest first, optionally for a
    /// single category.
    pub fn history(
        &self,
        category_id: Option<CategoryId>,
        hours: i64,
    ) -> Result<Vec<HistoryRow>, MonitorError> {
        let points = self.engine.history(category_id, Duration::hours(hours))?;
        Ok(points
            .into_iter()
            .map(|(id, point)| HistoryRow {
                category: self.category_name(id),
                count: point.count,
                timestamp: point.observed_at,
            })
            .collect())
    }

    /// Depletion trend per observed category over the last `hours`.
    pub fn trends(&self, hours: i64) -> Vec<TrendRow> {
        let states = self.engine.current_states();
        self.engine
            .trends(Duration::hours(hours))
            .into_iter()
            .map(|trend| {
                let current_count = states
                    .iter()
                    .find(|s| s.category_id == trend.category_id)
                    .map(|s| s.count)
                    .unwrap_or(0);
                TrendRow {
                    category: self.category_name(trend.category_id),
                    depletion_rate: trend.depletion_rate,
                    current_count,
                    hours_until_empty: trend.hours_until_empty,
                    suggested_restock: trend.suggested_restock,
                }
            })
            .collect()
    }

    /// Alert records, newest first. `active_only` hides resolved history.
    pub fn alerts(&self, active_only: bool) -> Vec<AlertRow> {
        let mut alerts = self.engine.alerts_snapshot();
        alerts.retain(|a| !active_only || a.is_active);
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        alerts
            .into_iter()
            .map(|alert| AlertRow {
                id: alert.id,
                category: self.category_name(alert.category_id),
                kind: alert.kind.as_str(),
                message: alert.message,
                count: alert.count_at_creation,
                is_active: alert.is_active,
                created_at: alert.created_at,
                resolved_at: alert.resolved_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::config::MonitorConfig;
    use crate::monitor::registry::{CategoryRegistry, CategorySpec};
    use crate::monitor::types::Observation;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn make_queries() -> (Queries, Arc<MonitorEngine>, Arc<AtomicI64>) {
        let registry = CategoryRegistry::from_specs(
            vec![
                CategorySpec {
                    id: Some(1),
                    name: "Dairy".to_string(),
                    description: None,
                    low_stock_threshold: Some(10),
                    critical_threshold: Some(5),
                },
                CategorySpec {
                    id: Some(2),
                    name: "Produce".to_string(),
                    description: None,
                    low_stock_threshold: Some(10),
                    critical_threshold: Some(5),
                },
            ],
            5,
            2,
        )
        .unwrap();

        let offset = Arc::new(AtomicI64::new(0));
        let clock_offset = offset.clone();
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let engine = Arc::new(MonitorEngine::with_clock(
            registry,
            MonitorConfig::default(),
            Box::new(move || base + Duration::seconds(clock_offset.load(Ordering::SeqCst))),
        ));
        (Queries::new(engine.clone()), engine, offset)
    }

    fn observe(engine: &MonitorEngine, category_id: i64, count: u32) {
        engine
            .ingest(Observation {
                category_id,
                count,
                confidence: 0.9,
                observed_at: None,
            })
            .unwrap();
    }

    #[test]
    fn test_current_rows_carry_threshold_and_status() {
        let (queries, engine, _clock) = make_queries();
        observe(&engine, 1, 7);

        let rows = queries.current();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, "Dairy");
        assert_eq!(rows[0].count, 7);
        assert_eq!(rows[0].low_stock_threshold, 10);
        assert_eq!(rows[0].status, StockStatus::Low);
    }

    #[test]
    fn test_history_chronological_across_categories() {
        let (queries, engine, clock) = make_queries();
        observe(&engine, 1, 20);
        clock.store(600, Ordering::SeqCst);
        observe(&engine, 2, 40);
        clock.store(1200, Ordering::SeqCst);
        observe(&engine, 1, 18);

        let rows = queries.history(None, 24).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["Dairy", "Produce", "Dairy"]);

        let dairy_only = queries.history(Some(1), 24).unwrap();
        assert_eq!(dairy_only.len(), 2);
    }

    #[test]
    fn test_trends_report_current_count() {
        let (queries, engine, clock) = make_queries();
        observe(&engine, 1, 20);
        clock.store(3600, Ordering::SeqCst);
        observe(&engine, 1, 15);

        let rows = queries.trends(24);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].current_count, 15);
        assert!((rows[0].depletion_rate - 5.0).abs() < 1e-9);
        assert!(rows[0].hours_until_empty.is_some());
    }

    #[test]
    fn test_alerts_newest_first_and_active_filter() {
        let (queries, engine, clock) = make_queries();
        observe(&engine, 1, 8);
        clock.store(600, Ordering::SeqCst);
        observe(&engine, 1, 30);
        clock.store(1200, Ordering::SeqCst);
        observe(&engine, 2, 3);

        let all = queries.alerts(false);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].category, "Produce");
        assert!(all[0].is_active);
        assert!(!all[1].is_active);

        let active = queries.alerts(true);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, "critical");
    }

    #[test]
    fn test_queries_never_mutate() {
        let (queries, engine, _clock) = make_queries();
        observe(&engine, 1, 20);

        let before = engine.history(None, Duration::hours(24)).unwrap().len();
        let _ = queries.current();
        let _ = queries.trends(24);
        let _ = queries.alerts(false);
        let after = engine.history(None, Duration::hours(24)).unwrap().len();
        assert_eq!(before, after);
    }
}
