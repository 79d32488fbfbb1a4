//! Recommendation enrichment
//!
//! Filters engine output by confidence and evidence, snaps surviving items to
//! a subscription cadence and attaches an advisory annual-savings estimate.

mod cadence;

pub use cadence::{estimate_annual_savings, match_cadence};

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::purchase::PriceBook;
use crate::domain::statistics::ItemStatistics;
use crate::domain::subscription::{SubscriptionPlan, SubscriptionRecommendation};
use crate::errors::DomainError;

/// Result type for enrichment operations
pub type EnrichmentResult<T> = Result<T, DomainError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Minimum confidence score (0 - 100) for a recommendation
    pub min_confidence: f64,
    /// Minimum number of purchases for a recommendation
    pub min_purchases: usize,
    /// Maximum distance in days between the mean interval and a ladder rung
    pub cadence_tolerance_days: f64,
    /// Subscribe-and-save discount as a fraction (0.05 = 5%)
    pub discount_rate: Decimal,
    /// Per-customer cap applied by the customer pipeline
    pub max_recommendations: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            min_confidence: 50.0,
            min_purchases: 3,
            cadence_tolerance_days: 3.0,
            discount_rate: Decimal::new(5, 2),
            max_recommendations: 10,
        }
    }
}

impl EnrichmentConfig {
    pub fn validate(&self) -> EnrichmentResult<()> {
        if !(self.min_confidence.is_finite() && (0.0..=100.0).contains(&self.min_confidence)) {
            return Err(DomainError::invalid_input(format!(
                "enrichment.min_confidence must be in range 0..=100 (got {})",
                self.min_confidence
            )));
        }
        if self.min_purchases < 1 {
            return Err(DomainError::invalid_input("enrichment.min_purchases must be at least 1"));
        }
        if !(self.cadence_tolerance_days.is_finite() && self.cadence_tolerance_days >= 0.0) {
            return Err(DomainError::invalid_input(
                "enrichment.cadence_tolerance_days must not be negative",
            ));
        }
        if self.discount_rate < Decimal::ZERO || self.discount_rate > Decimal::ONE {
            return Err(DomainError::invalid_input(
                "enrichment.discount_rate must be in range 0..=1",
            ));
        }
        if self.max_recommendations < 1 {
            return Err(DomainError::invalid_input(
                "enrichment.max_recommendations must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builds ranked subscription recommendations from per-item statistics.
///
/// Items pass when `confidence_score >= min_confidence` and
/// `purchase_count >= min_purchases`. Every passing item with a mean interval
/// yields one recommendation; a mean under half a day (including same-day
/// repeats) becomes a one-day `Custom` cadence. Items without any interval
/// (a single purchase) cannot be given a cadence and are dropped. Output is
/// sorted by descending confidence, then descending purchase count, then
/// item name.
pub fn enrich(
    stats: &BTreeMap<String, ItemStatistics>,
    prices: &PriceBook,
    config: &EnrichmentConfig,
) -> EnrichmentResult<Vec<SubscriptionRecommendation>> {
    config.validate()?;

    let mut recommendations: Vec<SubscriptionRecommendation> = stats
        .iter()
        .filter(|(_, item)| {
            item.confidence_score >= config.min_confidence
                && item.purchase_count >= config.min_purchases
        })
        .filter_map(|(name, item)| recommend(name, item, prices, config))
        .collect();

    recommendations.sort_by(|a, b| {
        b.confidence_score
            .total_cmp(&a.confidence_score)
            .then_with(|| b.purchase_count.cmp(&a.purchase_count))
            .then_with(|| a.item_name.cmp(&b.item_name))
    });

    Ok(recommendations)
}

fn recommend(
    name: &str,
    item: &ItemStatistics,
    prices: &PriceBook,
    config: &EnrichmentConfig,
) -> Option<SubscriptionRecommendation> {
    let Some(mean_interval) = item.mean_interval_days else {
        debug!(
            event_name = "enrichment.item.skipped",
            item = name,
            reason = "no_interval",
            "item has no interval data"
        );
        return None;
    };

    let (frequency, interval_days) = match_cadence(mean_interval, config.cadence_tolerance_days);

    let unit_price = prices.unit_price(name);
    if unit_price.is_none() {
        debug!(
            event_name = "enrichment.price.missing",
            item = name,
            "no unit price available, savings reported as zero"
        );
    }

    Some(SubscriptionRecommendation {
        item_name: name.to_string(),
        confidence_score: item.confidence_score,
        purchase_count: item.purchase_count,
        avg_interval_days: mean_interval,
        subscription: SubscriptionPlan {
            frequency,
            interval_days,
            estimated_annual_savings: estimate_annual_savings(
                unit_price,
                interval_days,
                config.discount_rate,
            ),
        },
    })
}
