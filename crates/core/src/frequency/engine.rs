use chrono::NaiveDate;
use tracing::trace;

use crate::domain::purchase::ItemHistory;
use crate::domain::statistics::{ConfidenceLevel, ItemStatistics};
use crate::errors::DomainError;

use super::scoring::{ScoreCalculator, SignalScores};
use super::trend::{self, TrendFit};
use super::{FrequencyResult, ScoringConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
struct IntervalSummary {
    mean: f64,
    stddev: f64,
    /// `None` when the mean gap is zero
    coefficient_of_variation: Option<f64>,
}

/// Mean and sample standard deviation of the gaps. A single gap has no
/// observable variance and reports a standard deviation of 0.
fn summarize(intervals: &[f64]) -> Option<IntervalSummary> {
    if intervals.is_empty() {
        return None;
    }

    let n = intervals.len() as f64;
    let mean = intervals.iter().sum::<f64>() / n;
    let stddev = if intervals.len() >= 2 {
        let squared: f64 = intervals.iter().map(|gap| (gap - mean).powi(2)).sum();
        (squared / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let coefficient_of_variation = (mean > 0.0).then(|| stddev / mean);

    Some(IntervalSummary { mean, stddev, coefficient_of_variation })
}

/// Computes regularity statistics and a confidence score for one item.
///
/// `reference_date` is the "today" against which recency is measured and must
/// not precede the last purchase. An empty history or an invalid
/// configuration fails with [`DomainError::InvalidInput`]; every non-empty
/// history produces a result.
pub fn analyze(
    history: &ItemHistory,
    reference_date: NaiveDate,
    config: &ScoringConfig,
) -> FrequencyResult<ItemStatistics> {
    config.validate()?;

    let (Some(first_purchase_date), Some(last_purchase_date)) = (history.first(), history.last())
    else {
        return Err(DomainError::invalid_input("purchase history must not be empty"));
    };

    if reference_date < last_purchase_date {
        return Err(DomainError::invalid_input(format!(
            "reference date {reference_date} precedes last purchase {last_purchase_date}"
        )));
    }

    let calculator = ScoreCalculator::new(config);
    let purchase_count = history.len();
    let intervals = history.intervals();
    let summary = summarize(&intervals);

    let trend_fit = match summary {
        Some(summary) => trend::fit(&intervals, summary.mean, config),
        None => TrendFit::UNKNOWN,
    };

    let coefficient_of_variation = summary.and_then(|summary| summary.coefficient_of_variation);
    let consistency_score = calculator.consistency_score(coefficient_of_variation);
    let days_since_last = (reference_date - last_purchase_date).num_days();
    let recency_weight = calculator.recency_weight(days_since_last);

    let signals = SignalScores {
        consistency: consistency_score / 100.0,
        recency: recency_weight,
        count: calculator.count_factor(purchase_count),
        trend_stability: calculator.trend_stability(trend_fit.strength),
    };
    let confidence_score = calculator.composite(&signals, purchase_count);

    trace!(
        event_name = "frequency.item.analyzed",
        purchase_count,
        days_since_last,
        confidence_score,
        "item history analyzed"
    );

    Ok(ItemStatistics {
        purchase_count,
        mean_interval_days: summary.map(|summary| summary.mean),
        stddev_interval_days: summary.map(|summary| summary.stddev),
        coefficient_of_variation,
        consistency_score,
        trend: trend_fit.trend,
        trend_slope: trend_fit.slope,
        trend_strength: trend_fit.strength,
        days_since_last,
        recency_weight,
        confidence_score,
        confidence_level: ConfidenceLevel::from_score(confidence_score),
        first_purchase_date,
        last_purchase_date,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::{analyze, summarize};
    use crate::domain::purchase::ItemHistory;
    use crate::domain::statistics::Trend;
    use crate::errors::DomainError;
    use crate::frequency::ScoringConfig;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date") + Duration::days(offset)
    }

    fn history(offsets: &[i64]) -> ItemHistory {
        offsets.iter().copied().map(day).collect()
    }

    #[test]
    fn weekly_history_scores_high_and_stable() {
        let config = ScoringConfig::default();
        let stats = analyze(&history(&[0, 7, 14, 21, 28, 35, 42, 49]), day(49), &config)
            .expect("weekly history analyzes");

        assert_eq!(stats.purchase_count, 8);
        assert_eq!(stats.mean_interval_days, Some(7.0));
        assert_eq!(stats.stddev_interval_days, Some(0.0));
        assert_eq!(stats.coefficient_of_variation, Some(0.0));
        assert_eq!(stats.consistency_score, 100.0);
        assert_eq!(stats.trend, Trend::Stable);
        assert_eq!(stats.recency_weight, 1.0);
        assert!(stats.confidence_score >= 80.0, "got {}", stats.confidence_score);
        assert_eq!(stats.first_purchase_date, day(0));
        assert_eq!(stats.last_purchase_date, day(49));
    }

    #[test]
    fn single_purchase_is_capped_and_has_no_interval_data() {
        let config = ScoringConfig::default();
        let stats = analyze(&history(&[0]), day(0), &config).expect("single purchase analyzes");

        assert_eq!(stats.purchase_count, 1);
        assert_eq!(stats.mean_interval_days, None);
        assert_eq!(stats.stddev_interval_days, None);
        assert_eq!(stats.coefficient_of_variation, None);
        assert_eq!(stats.trend, Trend::Unknown);
        assert_eq!(stats.trend_strength, 0.0);
        assert!(stats.confidence_score <= 30.0);
    }

    #[test]
    fn two_purchases_have_zero_stddev() {
        let config = ScoringConfig::default();
        let stats = analyze(&history(&[0, 9]), day(12), &config).expect("pair analyzes");

        assert_eq!(stats.mean_interval_days, Some(9.0));
        assert_eq!(stats.stddev_interval_days, Some(0.0));
        assert_eq!(stats.coefficient_of_variation, Some(0.0));
        assert_eq!(stats.trend, Trend::Unknown);
        assert_eq!(stats.days_since_last, 3);
    }

    #[test]
    fn same_day_purchases_have_undefined_cv() {
        let config = ScoringConfig::default();
        let stats = analyze(&history(&[5, 5, 5]), day(5), &config).expect("same-day analyzes");

        assert_eq!(stats.mean_interval_days, Some(0.0));
        assert_eq!(stats.coefficient_of_variation, None);
        assert_eq!(stats.consistency_score, 0.0);
        assert!((0.0..=100.0).contains(&stats.confidence_score));
    }

    #[test]
    fn shrinking_and_growing_gaps_classify_trend() {
        let config = ScoringConfig::default();

        let shrinking = analyze(&history(&[0, 20, 36, 48, 56]), day(56), &config).expect("ok");
        assert_eq!(shrinking.trend, Trend::Decreasing);
        assert!((shrinking.trend_slope + 4.0).abs() < 1e-9);

        let growing = analyze(&history(&[0, 8, 20, 36, 56]), day(56), &config).expect("ok");
        assert_eq!(growing.trend, Trend::Increasing);
    }

    #[test]
    fn irregular_history_scores_lower_than_regular() {
        let config = ScoringConfig::default();
        let regular = analyze(&history(&[0, 10, 20, 30, 40]), day(40), &config).expect("ok");
        let irregular = analyze(&history(&[0, 3, 25, 28, 40]), day(40), &config).expect("ok");

        assert!(irregular.consistency_score < regular.consistency_score);
        assert!(irregular.confidence_score < regular.confidence_score);
    }

    #[test]
    fn empty_history_is_invalid_input() {
        let config = ScoringConfig::default();
        let result = analyze(&ItemHistory::default(), day(0), &config);

        assert!(matches!(result, Err(DomainError::InvalidInput(ref msg)) if msg.contains("empty")));
    }

    #[test]
    fn reference_date_before_last_purchase_is_invalid_input() {
        let config = ScoringConfig::default();
        let result = analyze(&history(&[0, 7]), day(3), &config);
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScoringConfig { recency_half_life_days: -1.0, ..ScoringConfig::default() };
        assert!(analyze(&history(&[0, 7]), day(7), &config).is_err());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let config = ScoringConfig::default();
        let input = history(&[0, 6, 15, 21, 33, 40]);

        let first = analyze(&input, day(52), &config).expect("ok");
        let second = analyze(&input, day(52), &config).expect("ok");

        assert_eq!(first, second);
        assert_eq!(first.confidence_score.to_bits(), second.confidence_score.to_bits());
    }

    #[test]
    fn summarize_uses_sample_standard_deviation() {
        let summary = summarize(&[5.0, 9.0]).expect("two gaps");
        // mean 7, sample variance ((2^2 + 2^2) / 1) = 8
        assert!((summary.stddev - 8f64.sqrt()).abs() < 1e-12);
        assert!(summarize(&[]).is_none());
    }
}
