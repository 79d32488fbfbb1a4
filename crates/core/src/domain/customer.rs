use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::purchase::PurchaseEvent;
use crate::domain::statistics::ItemStatistics;
use crate::domain::subscription::SubscriptionRecommendation;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-customer analysis result: every item's statistics plus the ranked
/// subscription recommendations that survived enrichment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerReport {
    pub customer_id: CustomerId,
    pub reference_date: NaiveDate,
    pub items_analyzed: usize,
    pub statistics: BTreeMap<String, ItemStatistics>,
    pub recommendations: Vec<SubscriptionRecommendation>,
}

impl CustomerReport {
    pub fn has_recommendations(&self) -> bool {
        !self.recommendations.is_empty()
    }
}

/// All purchase events of one customer, as read from a data source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CustomerPurchases {
    pub customer_id: CustomerId,
    pub customer_name: Option<String>,
    pub events: Vec<PurchaseEvent>,
}

impl CustomerPurchases {
    pub fn latest_purchase_date(&self) -> Option<NaiveDate> {
        self.events.iter().map(PurchaseEvent::date).max()
    }
}
