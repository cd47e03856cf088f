//! Core data types for the inventory monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier for a product category
pub type CategoryId = i64;

/// A single stock-count reading for one category, as produced by the
/// external detection subsystem.
///
/// `count` is non-negative by construction; `confidence` is validated at
/// intake (see `Observation::validate`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub category_id: CategoryId,
    pub count: u32,
    pub confidence: f64,
    /// When the detection was made. Defaults to arrival time if the
    /// producer does not stamp it.
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

impl Observation {
    /// Check the intake invariants: confidence must be a finite fraction
    /// in [0, 1].
    pub fn validate(&self) -> Result<(), String> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence {} outside [0, 1] for category {}",
                self.confidence, self.category_id
            ));
        }
        Ok(())
    }
}

/// A stored observation within a category's time-series partition.
///
/// Points are ordered by `observed_at` ascending; the category is implied
/// by the partition holding the point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub count: u32,
    pub confidence: f64,
    pub observed_at: DateTime<Utc>,
}

/// Stock status derived from a count and the category's thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Normal,
    Low,
    Critical,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Normal => "normal",
            StockStatus::Low => "low",
            StockStatus::Critical => "critical",
        }
    }
}

/// Latest known state for one category: the most recent observation plus
/// the threshold-derived status. Overwritten wholesale on each ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentState {
    pub category_id: CategoryId,
    pub count: u32,
    pub confidence: f64,
    pub observed_at: DateTime<Utc>,
    pub status: StockStatus,
}

/// Restock recommendation derived from the depletion projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestockSuggestion {
    /// Projected stockout is within the lead-time safety margin
    Immediate,
    /// Restock can wait this many hours and still beat the projection
    InHours(f64),
}

/// Depletion trend for one category, fitted over the observation window.
///
/// Never persisted: always derivable from the time-series store.
#[derive(Debug, Clone, Serialize)]
pub struct TrendResult {
    pub category_id: CategoryId,
    /// Units consumed per hour; zero or negative means flat or growing
    pub depletion_rate: f64,
    /// `None` means no stockout projected (rate <= 0)
    pub hours_until_empty: Option<f64>,
    /// `None` when no restock is needed
    pub suggested_restock: Option<RestockSuggestion>,
    pub computed_at: DateTime<Utc>,
    pub sample_count: usize,
}

/// Alert severity/condition class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowStock,
    Critical,
    RestockSoon,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LowStock => "low_stock",
            AlertKind::Critical => "critical",
            AlertKind::RestockSoon => "restock_soon",
        }
    }
}

/// A stock alert. Created by the alert state machine on a condition
/// transition; mutated only by resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: u64,
    pub category_id: CategoryId,
    pub kind: AlertKind,
    pub message: String,
    pub count_at_creation: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// State change emitted by one alert-machine evaluation
#[derive(Debug, Clone)]
pub enum AlertDelta {
    Created(Alert),
    Resolved(Alert),
}

impl AlertDelta {
    pub fn alert(&self) -> &Alert {
        match self {
            AlertDelta::Created(a) | AlertDelta::Resolved(a) => a,
        }
    }
}
