//! Scoring signals for purchase regularity

use super::ScoringConfig;

/// Purchase counts below this are penalised in the count signal.
const MIN_TRUSTED_PURCHASES: usize = 3;

/// Normalised inputs to the composite confidence score, each in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalScores {
    pub consistency: f64,
    pub recency: f64,
    pub count: f64,
    pub trend_stability: f64,
}

/// Score calculator bound to one scoring configuration
#[derive(Debug, Clone, Copy)]
pub struct ScoreCalculator<'a> {
    config: &'a ScoringConfig,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// Maps a coefficient of variation onto 0 - 100 as `100 / (1 + cv)`.
    ///
    /// A missing CV (single purchase, or every purchase on the same day) has
    /// no observable cadence and scores 0.
    pub fn consistency_score(&self, coefficient_of_variation: Option<f64>) -> f64 {
        match coefficient_of_variation {
            Some(cv) if cv.is_finite() && cv >= 0.0 => (100.0 / (1.0 + cv)).clamp(0.0, 100.0),
            _ => 0.0,
        }
    }

    /// Exponential decay `0.5 ^ (days / half_life)`.
    pub fn recency_weight(&self, days_since_last: i64) -> f64 {
        let days = days_since_last.max(0) as f64;
        0.5f64.powf(days / self.config.recency_half_life_days).clamp(0.0, 1.0)
    }

    /// Saturates at `count_saturation` purchases; fewer than three purchases
    /// count half.
    pub fn count_factor(&self, purchase_count: usize) -> f64 {
        let saturation = f64::from(self.config.count_saturation.max(1));
        let factor = (purchase_count as f64 / saturation).min(1.0);
        if purchase_count < MIN_TRUSTED_PURCHASES {
            factor * 0.5
        } else {
            factor
        }
    }

    pub fn trend_stability(&self, trend_strength: f64) -> f64 {
        (1.0 - trend_strength).clamp(0.0, 1.0)
    }

    /// Weighted sum of the signals scaled to 0 - 100.
    pub fn composite(&self, signals: &SignalScores, purchase_count: usize) -> f64 {
        let weights = &self.config.weights;
        let total = signals.consistency * weights.consistency
            + signals.recency * weights.recency
            + signals.count * weights.count
            + signals.trend_stability * weights.trend_stability;

        let score = (total * 100.0).clamp(0.0, 100.0);
        if purchase_count <= 1 {
            score.min(self.config.single_purchase_cap)
        } else {
            score
        }
    }
}
