use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Discrete subscription interval class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Weekly,
    Biweekly,
    Monthly,
    Custom,
}

impl Cadence {
    /// Fixed ladder rungs, shortest first.
    pub const LADDER: [Cadence; 3] = [Cadence::Weekly, Cadence::Biweekly, Cadence::Monthly];

    pub fn rung_days(&self) -> Option<u32> {
        match self {
            Cadence::Weekly => Some(7),
            Cadence::Biweekly => Some(14),
            Cadence::Monthly => Some(30),
            Cadence::Custom => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub frequency: Cadence,
    pub interval_days: u32,
    pub estimated_annual_savings: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecommendation {
    pub item_name: String,
    pub confidence_score: f64,
    pub purchase_count: usize,
    pub avg_interval_days: f64,
    pub subscription: SubscriptionPlan,
}
