//! Per-category time-series partition with retention eviction

use chrono::{DateTime, Duration, Utc};

use super::types::TimeSeriesPoint;

/// Append-only series of stock observations for a single category.
///
/// Points are kept ordered by `observed_at` ascending. Observations may
/// arrive out of order (the detector stamps its own timestamps); `append`
/// inserts at the timestamp position, and equal timestamps keep arrival
/// order. Memory stays O(points in the retention window) via
/// `evict_older_than`.
#[derive(Debug, Clone, Default)]
pub struct CategorySeries {
    points: Vec<TimeSeriesPoint>,
}

impl CategorySeries {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Insert a point in timestamp order.
    ///
    /// Points with a timestamp equal to an existing one land after it, so
    /// arrival order is preserved and the series is never reordered.
    pub fn append(&mut self, point: TimeSeriesPoint) {
        let idx = self
            .points
            .partition_point(|p| p.observed_at <= point.observed_at);
        if idx == self.points.len() {
            self.points.push(point);
        } else {
            self.points.insert(idx, point);
        }
    }

    /// All points with `observed_at >= now - duration`, oldest first.
    ///
    /// The lower bound is inclusive. Returns an empty slice if nothing is
    /// in range.
    pub fn window(&self, now: DateTime<Utc>, duration: Duration) -> &[TimeSeriesPoint] {
        let cutoff = now - duration;
        let idx = self.points.partition_point(|p| p.observed_at < cutoff);
        &self.points[idx..]
    }

    /// Drop points older than the horizon.
    ///
    /// Idempotent. Never removes the category's sole remaining point: the
    /// newest observation survives even when it is past the horizon, so
    /// the current state stays resolvable.
    pub fn evict_older_than(&mut self, horizon: DateTime<Utc>) {
        let mut cut = self.points.partition_point(|p| p.observed_at < horizon);
        if cut == self.points.len() && cut > 0 {
            cut -= 1;
        }
        self.points.drain(..cut);
    }

    /// Most recent point, if any
    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn make_point(secs: i64, count: u32) -> TimeSeriesPoint {
        TimeSeriesPoint {
            count,
            confidence: 0.9,
            observed_at: ts(secs),
        }
    }

    #[test]
    fn test_append_keeps_timestamp_order() {
        // Out-of-order arrival: the late point lands at its timestamp slot
        let mut series = CategorySeries::new();
        series.append(make_point(0, 20));
        series.append(make_point(120, 18));
        series.append(make_point(60, 19));

        let counts: Vec<u32> = series
            .window(ts(120), Duration::hours(1))
            .iter()
            .map(|p| p.count)
            .collect();
        assert_eq!(counts, vec![20, 19, 18]);
    }

    #[test]
    fn test_append_duplicate_timestamp_preserves_arrival_order() {
        let mut series = CategorySeries::new();
        series.append(make_point(60, 10));
        series.append(make_point(60, 11));
        series.append(make_point(60, 12));

        let counts: Vec<u32> = series
            .window(ts(60), Duration::minutes(5))
            .iter()
            .map(|p| p.count)
            .collect();
        assert_eq!(counts, vec![10, 11, 12]);
    }

    #[test]
    fn test_window_lower_bound_inclusive() {
        let mut series = CategorySeries::new();
        series.append(make_point(0, 20));
        series.append(make_point(3600, 15));

        // Window of exactly 1h from t=3600: the point at t=0 sits on the
        // boundary and must be included
        let window = series.window(ts(3600), Duration::hours(1));
        assert_eq!(window.len(), 2);

        // One second narrower: boundary point falls out
        let window = series.window(ts(3600), Duration::seconds(3599));
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].count, 15);
    }

    #[test]
    fn test_window_empty_when_nothing_in_range() {
        let mut series = CategorySeries::new();
        series.append(make_point(0, 20));

        let window = series.window(ts(7200), Duration::minutes(30));
        assert!(window.is_empty());
    }

    #[test]
    fn test_evict_removes_expired_points() {
        let mut series = CategorySeries::new();
        for i in 0..5 {
            series.append(make_point(i * 600, 20 - i as u32));
        }

        series.evict_older_than(ts(1200));
        assert_eq!(series.len(), 3);
        assert_eq!(series.latest().unwrap().count, 16);
    }

    #[test]
    fn test_evict_keeps_sole_newest_point() {
        // All points are past the horizon: the newest one must survive so
        // current state stays resolvable
        let mut series = CategorySeries::new();
        series.append(make_point(0, 20));
        series.append(make_point(60, 18));

        series.evict_older_than(ts(86_400));
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest().unwrap().count, 18);
    }

    #[test]
    fn test_evict_idempotent() {
        let mut series = CategorySeries::new();
        series.append(make_point(0, 20));
        series.append(make_point(3600, 18));

        series.evict_older_than(ts(1800));
        let after_first = series.len();
        series.evict_older_than(ts(1800));
        assert_eq!(series.len(), after_first);
    }

    #[test]
    fn test_evict_on_empty_series() {
        let mut series = CategorySeries::new();
        series.evict_older_than(ts(0));
        assert!(series.is_empty());
    }
}
