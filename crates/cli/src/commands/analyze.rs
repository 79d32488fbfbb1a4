use std::path::PathBuf;

use chrono::NaiveDate;
use pantree_core::analysis::analyze_customers;
use pantree_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use pantree_core::dataset::{self, Dataset};
use pantree_core::domain::customer::{CustomerPurchases, CustomerReport};
use pantree_core::errors::{ApplicationError, DomainError};
use serde::Serialize;
use tracing::{debug, info};

use crate::commands::CommandResult;

const COMMAND: &str = "analyze";

#[derive(Clone, Debug, Default)]
pub struct AnalyzeArgs {
    pub dataset_dir: Option<PathBuf>,
    pub customer: Option<String>,
    pub limit: usize,
    pub min_purchases: Option<usize>,
    pub min_confidence: Option<f64>,
    pub reference_date: Option<NaiveDate>,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput {
    command: &'static str,
    status: &'static str,
    dataset: String,
    reference_date: NaiveDate,
    customers_analyzed: usize,
    customers_with_recommendations: usize,
    reports: Vec<CustomerReport>,
}

pub fn run(args: AnalyzeArgs) -> CommandResult {
    match execute(args) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn execute(args: AnalyzeArgs) -> Result<String, ApplicationError> {
    let require_file = args.config_path.is_some();
    let config = AppConfig::load(LoadOptions {
        config_path: args.config_path,
        require_file,
        overrides: ConfigOverrides {
            dataset_path: args.dataset_dir,
            min_confidence: args.min_confidence,
            min_purchases: args.min_purchases,
            ..ConfigOverrides::default()
        },
    })?;

    if let Err(error) = crate::init_logging(&config.logging) {
        debug!(event_name = "cli.logging.reused", error = %error, "log subscriber already set");
    }

    let dataset = dataset::load_dir(&config.dataset.path)?;
    let customers = select_customers(&dataset, args.customer.as_deref())?;

    // Every customer is scored against the same reference date.
    let latest = args.reference_date.or_else(|| dataset.latest_purchase_date());
    let Some(reference_date) = latest else {
        return Err(DomainError::invalid_input("dataset contains no purchase events").into());
    };

    let reports =
        analyze_customers(customers, Some(reference_date), &config.scoring, &config.enrichment)?;
    let customers_analyzed = reports.len();
    let with_recommendations: Vec<CustomerReport> =
        reports.into_iter().filter(CustomerReport::has_recommendations).collect();
    let customers_with_recommendations = with_recommendations.len();
    let selected: Vec<CustomerReport> =
        with_recommendations.into_iter().take(args.limit).collect();

    info!(
        event_name = "cli.analyze.completed",
        customers_analyzed,
        reports = selected.len(),
        reference_date = %reference_date,
        "analysis finished"
    );

    let output = AnalyzeOutput {
        command: COMMAND,
        status: "ok",
        dataset: config.dataset.path.display().to_string(),
        reference_date,
        customers_analyzed,
        customers_with_recommendations,
        reports: selected,
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

fn select_customers<'a>(
    dataset: &'a Dataset,
    customer_id: Option<&str>,
) -> Result<&'a [CustomerPurchases], ApplicationError> {
    let Some(customer_id) = customer_id else {
        return Ok(&dataset.customers);
    };

    dataset.customer(customer_id).map(std::slice::from_ref).ok_or_else(|| {
        DomainError::invalid_input(format!("customer `{customer_id}` not found in dataset")).into()
    })
}
