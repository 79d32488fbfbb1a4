//! Purchase Frequency & Confidence Engine
//!
//! Turns one item's purchase-date history into regularity statistics, a
//! trend classification and a 0 - 100 confidence score. Every function here
//! is pure: the same history, reference date and configuration always give
//! the same result.

mod engine;
mod scoring;
mod trend;

pub use engine::analyze;
pub use scoring::{ScoreCalculator, SignalScores};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Result type for frequency operations
pub type FrequencyResult<T> = Result<T, DomainError>;

/// Default composite weights
pub const DEFAULT_WEIGHTS: ScoringWeights =
    ScoringWeights { consistency: 0.35, recency: 0.25, count: 0.25, trend_stability: 0.15 };

/// Allowed drift of the weight sum away from 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights for the composite confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for interval regularity (default: 0.35)
    pub consistency: f64,
    /// Weight for how recent the last purchase is (default: 0.25)
    pub recency: f64,
    /// Weight for the amount of evidence (default: 0.25)
    pub count: f64,
    /// Weight for the absence of a trend (default: 0.15)
    pub trend_stability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.consistency + self.recency + self.count + self.trend_stability
    }

    pub fn validate(&self) -> FrequencyResult<()> {
        let components = [
            ("consistency", self.consistency),
            ("recency", self.recency),
            ("count", self.count),
            ("trend_stability", self.trend_stability),
        ];
        for (name, weight) in components {
            if !weight.is_finite() || weight < 0.0 {
                return Err(DomainError::invalid_input(format!(
                    "scoring.weights.{name} must be a non-negative number"
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DomainError::invalid_input(format!(
                "scoring.weights must sum to 1.0 (got {sum})"
            )));
        }

        Ok(())
    }
}

/// Engine configuration, threaded explicitly into every `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Days after which the recency weight halves
    pub recency_half_life_days: f64,
    /// Minimum number of intervals needed to fit a trend
    pub trend_window_min_points: usize,
    /// |slope| in days per purchase above which a trend is reported
    pub trend_slope_threshold_days: f64,
    /// Purchase count at which the count signal saturates
    pub count_saturation: u32,
    /// Upper bound on the confidence of a single-purchase history
    pub single_purchase_cap: f64,
    pub weights: ScoringWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            recency_half_life_days: 30.0,
            trend_window_min_points: 3,
            trend_slope_threshold_days: 2.0,
            count_saturation: 10,
            single_purchase_cap: 30.0,
            weights: DEFAULT_WEIGHTS,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> FrequencyResult<()> {
        if !(self.recency_half_life_days.is_finite() && self.recency_half_life_days > 0.0) {
            return Err(DomainError::invalid_input(
                "scoring.recency_half_life_days must be greater than zero",
            ));
        }
        if self.trend_window_min_points < 3 {
            return Err(DomainError::invalid_input(
                "scoring.trend_window_min_points must be at least 3",
            ));
        }
        if !(self.trend_slope_threshold_days.is_finite() && self.trend_slope_threshold_days > 0.0)
        {
            return Err(DomainError::invalid_input(
                "scoring.trend_slope_threshold_days must be greater than zero",
            ));
        }
        if self.count_saturation == 0 {
            return Err(DomainError::invalid_input(
                "scoring.count_saturation must be at least 1",
            ));
        }
        if !(0.0..=100.0).contains(&self.single_purchase_cap) {
            return Err(DomainError::invalid_input(
                "scoring.single_purchase_cap must be in range 0..=100",
            ));
        }
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{ScoringConfig, ScoringWeights, DEFAULT_WEIGHTS};
    use crate::errors::DomainError;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ScoringConfig::default().validate(), Ok(()));
        assert!((DEFAULT_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let weights =
            ScoringWeights { consistency: 0.5, recency: 0.5, count: 0.25, trend_stability: 0.0 };
        let error = weights.validate().expect_err("weights summing to 1.25 are rejected");
        assert!(matches!(error, DomainError::InvalidInput(ref msg) if msg.contains("sum to 1.0")));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let weights =
            ScoringWeights { consistency: 1.2, recency: -0.2, count: 0.0, trend_stability: 0.0 };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let half_life = ScoringConfig { recency_half_life_days: 0.0, ..ScoringConfig::default() };
        assert!(half_life.validate().is_err());

        let window = ScoringConfig { trend_window_min_points: 2, ..ScoringConfig::default() };
        assert!(window.validate().is_err());

        let cap = ScoringConfig { single_purchase_cap: 120.0, ..ScoringConfig::default() };
        assert!(cap.validate().is_err());
    }
}
