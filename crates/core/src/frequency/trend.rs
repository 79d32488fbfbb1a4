use crate::domain::statistics::Trend;

use super::ScoringConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TrendFit {
    pub trend: Trend,
    pub slope: f64,
    pub strength: f64,
}

impl TrendFit {
    pub(crate) const UNKNOWN: TrendFit =
        TrendFit { trend: Trend::Unknown, slope: 0.0, strength: 0.0 };
}

/// Least-squares slope of interval length against interval index.
fn least_squares_slope(intervals: &[f64]) -> f64 {
    let n = intervals.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = intervals.iter().sum::<f64>() / n;

    let (numerator, denominator) =
        intervals.iter().enumerate().fold((0.0, 0.0), |(num, den), (index, &y)| {
            let dx = index as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub(crate) fn fit(intervals: &[f64], mean_interval: f64, config: &ScoringConfig) -> TrendFit {
    if intervals.len() < config.trend_window_min_points.max(2) {
        return TrendFit::UNKNOWN;
    }

    let slope = least_squares_slope(intervals);
    let threshold = config.trend_slope_threshold_days;
    let trend = if slope < -threshold {
        Trend::Decreasing
    } else if slope > threshold {
        Trend::Increasing
    } else {
        Trend::Stable
    };

    let strength = if mean_interval > 0.0 {
        (slope.abs() / mean_interval).clamp(0.0, 1.0)
    } else if slope == 0.0 {
        0.0
    } else {
        1.0
    };

    TrendFit { trend, slope, strength }
}
