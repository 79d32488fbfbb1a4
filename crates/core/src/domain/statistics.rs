use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of change in the gaps between purchases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Gaps are growing, the item is bought less often.
    Increasing,
    /// Gaps are shrinking, the item is bought more often.
    Decreasing,
    Stable,
    /// Too few intervals to fit a slope.
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// score >= 80
    VeryHigh,
    /// score 65 - 79.9
    High,
    /// score 50 - 64.9
    Moderate,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ConfidenceLevel::VeryHigh
        } else if score >= 65.0 {
            ConfidenceLevel::High
        } else if score >= 50.0 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Output of the frequency engine for one item.
///
/// Interval fields are `None` when fewer than two purchases exist, and the
/// coefficient of variation is also `None` when the mean gap is zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemStatistics {
    pub purchase_count: usize,
    pub mean_interval_days: Option<f64>,
    pub stddev_interval_days: Option<f64>,
    pub coefficient_of_variation: Option<f64>,
    /// 0 - 100, higher means more regular spacing
    pub consistency_score: f64,
    pub trend: Trend,
    /// Least-squares slope of interval length against purchase order, in days
    pub trend_slope: f64,
    /// 0 - 1, |slope| relative to the mean interval
    pub trend_strength: f64,
    pub days_since_last: i64,
    /// 0 - 1, 1.0 for a purchase made on the reference date
    pub recency_weight: f64,
    /// 0 - 100 composite
    pub confidence_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub first_purchase_date: NaiveDate,
    pub last_purchase_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::{ConfidenceLevel, Trend};

    #[test]
    fn confidence_level_bands() {
        assert_eq!(ConfidenceLevel::from_score(95.0), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(80.0), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(70.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(50.0), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_score(49.9), ConfidenceLevel::Low);
    }

    #[test]
    fn trend_serializes_as_snake_case() {
        let json = serde_json::to_string(&Trend::Decreasing).expect("serialize");
        assert_eq!(json, "\"decreasing\"");
    }
}
