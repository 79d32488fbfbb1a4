//! Customer-level subscribe & save analysis
//!
//! Groups a customer's purchases by item, runs the frequency engine on every
//! item in parallel and hands the results to enrichment.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::customer::{CustomerId, CustomerPurchases, CustomerReport};
use crate::domain::purchase::{group_histories, PriceBook, PurchaseEvent};
use crate::domain::statistics::ItemStatistics;
use crate::enrichment::{enrich, EnrichmentConfig};
use crate::errors::DomainError;
use crate::frequency::{analyze, ScoringConfig};

/// Analyzes every item a customer bought and ranks subscription candidates.
///
/// Without an explicit `reference_date` the customer's latest purchase is
/// used. Recommendations are capped at `enrichment.max_recommendations`.
pub fn analyze_customer(
    customer_id: CustomerId,
    events: &[PurchaseEvent],
    reference_date: Option<NaiveDate>,
    scoring: &ScoringConfig,
    enrichment: &EnrichmentConfig,
) -> Result<CustomerReport, DomainError> {
    scoring.validate()?;
    enrichment.validate()?;

    let Some(latest) = events.iter().map(PurchaseEvent::date).max() else {
        return Err(DomainError::invalid_input(format!(
            "customer `{customer_id}` has no purchase events"
        )));
    };
    let reference_date = reference_date.unwrap_or(latest);

    let histories = group_histories(events);
    let statistics: BTreeMap<String, ItemStatistics> = histories
        .par_iter()
        .map(|(name, history)| {
            analyze(history, reference_date, scoring).map(|stats| (name.clone(), stats))
        })
        .collect::<Result<_, _>>()?;

    let prices = PriceBook::from_events(events);
    let mut recommendations = enrich(&statistics, &prices, enrichment)?;
    recommendations.truncate(enrichment.max_recommendations);

    debug!(
        event_name = "analysis.customer.completed",
        customer_id = %customer_id,
        items_analyzed = statistics.len(),
        recommendations = recommendations.len(),
        "customer analysis completed"
    );

    Ok(CustomerReport {
        customer_id,
        reference_date,
        items_analyzed: statistics.len(),
        statistics,
        recommendations,
    })
}

/// Analyzes many customers in parallel, keeping input order.
///
/// Customers without any purchase events are skipped with a warning rather
/// than failing the batch.
pub fn analyze_customers(
    customers: &[CustomerPurchases],
    reference_date: Option<NaiveDate>,
    scoring: &ScoringConfig,
    enrichment: &EnrichmentConfig,
) -> Result<Vec<CustomerReport>, DomainError> {
    scoring.validate()?;
    enrichment.validate()?;

    let reports = customers
        .par_iter()
        .filter(|customer| {
            if customer.events.is_empty() {
                warn!(
                    event_name = "analysis.customer.skipped",
                    customer_id = %customer.customer_id,
                    "customer has no usable purchase events"
                );
                return false;
            }
            true
        })
        .map(|customer| {
            analyze_customer(
                customer.customer_id.clone(),
                &customer.events,
                reference_date,
                scoring,
                enrichment,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let with_recommendations =
        reports.iter().filter(|report| report.has_recommendations()).count();
    info!(
        event_name = "analysis.batch.completed",
        customers = reports.len(),
        with_recommendations,
        "batch analysis completed"
    );

    Ok(reports)
}
