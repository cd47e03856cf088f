//! Monitor configuration from environment variables

use std::env;

/// Tuning knobs for the monitoring engine.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time-series retention window in hours
    pub retention_hours: i64,

    /// Window the trend calculator fits over, in hours
    pub trend_window_hours: i64,

    /// Default low-stock threshold for categories without their own
    pub default_low_threshold: u32,

    /// Default critical threshold for categories without their own
    pub default_critical_threshold: u32,

    /// Restock lead-time safety margin in hours
    pub lead_time_hours: f64,

    /// Projection horizon that opens a restock_soon alert, in hours
    pub restock_soon_hours: f64,
}

impl MonitorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `RETENTION_HOURS` (default: 24)
    /// - `TREND_WINDOW_HOURS` (default: 24)
    /// - `LOW_STOCK_THRESHOLD` (default: 5)
    /// - `CRITICAL_STOCK_THRESHOLD` (default: 2)
    /// - `LEAD_TIME_HOURS` (default: 4.0)
    /// - `RESTOCK_SOON_HOURS` (default: 2 × lead time)
    pub fn from_env() -> Self {
        let lead_time_hours = env::var("LEAD_TIME_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4.0);

        Self {
            retention_hours: env::var("RETENTION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),

            trend_window_hours: env::var("TREND_WINDOW_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),

            default_low_threshold: env::var("LOW_STOCK_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),

            default_critical_threshold: env::var("CRITICAL_STOCK_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),

            restock_soon_hours: env::var("RESTOCK_SOON_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(lead_time_hours * 2.0),

            lead_time_hours,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            retention_hours: 24,
            trend_window_hours: 24,
            default_low_threshold: 5,
            default_critical_threshold: 2,
            lead_time_hours: 4.0,
            restock_soon_hours: 8.0,
        }
    }
}
