pub mod analysis;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod enrichment;
pub mod errors;
pub mod frequency;

pub use analysis::{analyze_customer, analyze_customers};
pub use dataset::{load_dir, Dataset, DatasetError};
pub use domain::customer::{CustomerId, CustomerPurchases, CustomerReport};
pub use domain::purchase::{group_histories, ItemHistory, PriceBook, PurchaseEvent};
pub use domain::statistics::{ConfidenceLevel, ItemStatistics, Trend};
pub use domain::subscription::{Cadence, SubscriptionPlan, SubscriptionRecommendation};
pub use enrichment::{enrich, EnrichmentConfig};
pub use errors::{ApplicationError, DomainError};
pub use frequency::{analyze, ScoringConfig, ScoringWeights};
