//! Depletion trend estimation
//!
//! Fits a least-squares line to count-vs-time over the observation window.
//! Regression over the raw samples tolerates the irregular cadence of a
//! detection-driven feed, unlike fixed-interval smoothing.

use chrono::{DateTime, Utc};

use super::types::{CategoryId, RestockSuggestion, TimeSeriesPoint, TrendResult};

/// Compute the depletion trend for one category over its window.
///
/// With fewer than two samples (or a degenerate window where every sample
/// shares a timestamp) the rate is zero and no stockout is projected.
/// `depletion_rate` is the negated regression slope, so a positive rate
/// means stock is being consumed.
pub fn compute_trend(
    category_id: CategoryId,
    window: &[TimeSeriesPoint],
    lead_time_hours: f64,
    computed_at: DateTime<Utc>,
) -> TrendResult {
    let sample_count = window.len();

    let depletion_rate = match fit_slope(window) {
        Some(slope) => -slope,
        None => 0.0,
    };

    let hours_until_empty = if depletion_rate > 0.0 {
        // Safe: sample_count >= 2 whenever a slope was fitted
        let current_count = window[sample_count - 1].count as f64;
        Some((current_count / depletion_rate).max(0.0))
    } else {
        None
    };

    let suggested_restock = hours_until_empty.map(|hours| {
        if hours <= lead_time_hours {
            RestockSuggestion::Immediate
        } else {
            RestockSuggestion::InHours(hours - lead_time_hours)
        }
    });

    TrendResult {
        category_id,
        depletion_rate,
        hours_until_empty,
        suggested_restock,
        computed_at,
        sample_count,
    }
}

/// Least-squares slope of count against elapsed hours since window start.
///
/// Returns `None` when a line cannot be fitted: fewer than two points, or
/// zero time spread.
fn fit_slope(window: &[TimeSeriesPoint]) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }

    let start = window[0].observed_at;
    let n = window.len() as f64;

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for p in window {
        sum_x += hours_since(start, p.observed_at);
        sum_y += p.count as f64;
    }
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for p in window {
        let dx = hours_since(start, p.observed_at) - mean_x;
        let dy = p.count as f64 - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
    }

    if sxx == 0.0 {
        return None;
    }
    Some(sxy / sxx)
}

fn hours_since(start: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    (at - start).num_milliseconds() as f64 / 3_600_000.0
}
