//! Current-state derivation from thresholds

use super::registry::Category;
use super::types::{CurrentState, StockStatus, TimeSeriesPoint};

/// Derive stock status from a count and the category's thresholds.
///
/// `count <= critical` is critical, `critical < count <= low` is low,
/// everything above is normal. Pure and deterministic.
pub fn stock_status(count: u32, category: &Category) -> StockStatus {
    if count <= category.critical_threshold {
        StockStatus::Critical
    } else if count <= category.low_stock_threshold {
        StockStatus::Low
    } else {
        StockStatus::Normal
    }
}

impl CurrentState {
    /// Build the replacement state for a category from its newest point.
    pub fn from_point(category: &Category, point: &TimeSeriesPoint) -> Self {
        Self {
            category_id: category.id,
            count: point.count,
            confidence: point.confidence,
            observed_at: point.observed_at,
            status: stock_status(point.count, category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_category(low: u32, critical: u32) -> Category {
        Category {
            id: 1,
            name: "Dairy".to_string(),
            description: None,
            low_stock_threshold: low,
            critical_threshold: critical,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_ladder() {
        // low=10, critical=5: boundaries are inclusive on the lower side
        let cat = make_category(10, 5);

        assert_eq!(stock_status(0, &cat), StockStatus::Critical);
        assert_eq!(stock_status(5, &cat), StockStatus::Critical);
        assert_eq!(stock_status(6, &cat), StockStatus::Low);
        assert_eq!(stock_status(10, &cat), StockStatus::Low);
        assert_eq!(stock_status(11, &cat), StockStatus::Normal);
        assert_eq!(stock_status(100, &cat), StockStatus::Normal);
    }

    #[test]
    fn test_from_point_carries_observation_fields() {
        let cat = make_category(10, 5);
        let point = TimeSeriesPoint {
            count: 7,
            confidence: 0.83,
            observed_at: Utc::now(),
        };

        let state = CurrentState::from_point(&cat, &point);
        assert_eq!(state.category_id, 1);
        assert_eq!(state.count, 7);
        assert_eq!(state.confidence, 0.83);
        assert_eq!(state.status, StockStatus::Low);
    }
}
