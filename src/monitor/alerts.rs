//! Per-category alert state machine
//!
//! Each category owns an append-only alert log. At most one alert per
//! `(category, kind)` is active at any instant; re-entering a condition
//! after recovery opens a fresh alert rather than resurrecting the old
//! record, so resolved alerts keep their history.

use chrono::{DateTime, Utc};

use super::registry::Category;
use super::types::{Alert, AlertDelta, AlertKind, CurrentState, StockStatus, TrendResult};

/// Alert records for a single category, active and resolved.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self { alerts: Vec::new() }
    }

    fn active_idx(&self, kind: AlertKind) -> Option<usize> {
        self.alerts
            .iter()
            .position(|a| a.is_active && a.kind == kind)
    }

    fn open(
        &mut self,
        id: u64,
        category: &Category,
        kind: AlertKind,
        message: String,
        count: u32,
        now: DateTime<Utc>,
    ) -> Alert {
        let alert = Alert {
            id,
            category_id: category.id,
            kind,
            message,
            count_at_creation: count,
            is_active: true,
            created_at: now,
            resolved_at: None,
        };
        self.alerts.push(alert.clone());
        alert
    }

    fn close(&mut self, idx: usize, now: DateTime<Utc>) -> Alert {
        let alert = &mut self.alerts[idx];
        alert.is_active = false;
        alert.resolved_at = Some(now);
        alert.clone()
    }

    /// Run one evaluation of the state machine against the latest state
    /// and trend. Returns the alerts created or resolved by this step.
    ///
    /// `next_id` allocates globally-unique alert ids.
    pub fn evaluate(
        &mut self,
        category: &Category,
        state: &CurrentState,
        trend: &TrendResult,
        restock_soon_hours: f64,
        now: DateTime<Utc>,
        mut next_id: impl FnMut() -> u64,
    ) -> Vec<AlertDelta> {
        let mut deltas = Vec::new();

        match state.status {
            StockStatus::Critical => {
                // Escalation keeps an existing low_stock alert active;
                // the two coexist, distinguished by kind
                if self.active_idx(AlertKind::Critical).is_none() {
                    let message = format!(
                        "{} is critically low ({} remaining)",
                        category.name, state.count
                    );
                    let alert = self.open(
                        next_id(),
                        category,
                        AlertKind::Critical,
                        message,
                        state.count,
                        now,
                    );
                    deltas.push(AlertDelta::Created(alert));
                }
            }
            StockStatus::Low => {
                if self.active_idx(AlertKind::LowStock).is_none() {
                    let message = format!(
                        "{} is running low ({} remaining)",
                        category.name, state.count
                    );
                    let alert = self.open(
                        next_id(),
                        category,
                        AlertKind::LowStock,
                        message,
                        state.count,
                        now,
                    );
                    deltas.push(AlertDelta::Created(alert));
                }
            }
            StockStatus::Normal => {
                // A single normal reading resolves immediately; re-entry
                // later opens a new alert identity
                if let Some(idx) = self.active_idx(AlertKind::LowStock) {
                    deltas.push(AlertDelta::Resolved(self.close(idx, now)));
                }
                if let Some(idx) = self.active_idx(AlertKind::Critical) {
                    deltas.push(AlertDelta::Resolved(self.close(idx, now)));
                }
            }
        }

        match trend.hours_until_empty {
            Some(hours) if hours <= restock_soon_hours => {
                if self.active_idx(AlertKind::RestockSoon).is_none() {
                    let message = format!(
                        "{} projected to run out in {:.1}h",
                        category.name, hours
                    );
                    let alert = self.open(
                        next_id(),
                        category,
                        AlertKind::RestockSoon,
                        message,
                        state.count,
                        now,
                    );
                    deltas.push(AlertDelta::Created(alert));
                }
            }
            _ => {
                // Projection recovered above the threshold (or went flat):
                // the restock warning no longer applies
                if let Some(idx) = self.active_idx(AlertKind::RestockSoon) {
                    deltas.push(AlertDelta::Resolved(self.close(idx, now)));
                }
            }
        }

        deltas
    }

    /// Explicit resolution by id.
    ///
    /// Idempotent: resolving an already-resolved alert returns the record
    /// unchanged. Returns `None` if the id is not in this log.
    pub fn resolve(&mut self, alert_id: u64, now: DateTime<Utc>) -> Option<Alert> {
        let idx = self.alerts.iter().position(|a| a.id == alert_id)?;
        if !self.alerts[idx].is_active {
            return Some(self.alerts[idx].clone());
        }
        Some(self.close(idx, now))
    }

    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn active_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.is_active).count()
    }
}
