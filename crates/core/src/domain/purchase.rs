use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A single line item bought on a given day.
///
/// `price` is the line total paid, so a line of three cartons at 2.00 each
/// carries a price of 6.00 and a quantity of 3.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PurchaseEvent {
    item_name: String,
    date: NaiveDate,
    price: Decimal,
    quantity: u32,
}

impl PurchaseEvent {
    pub fn new(
        item_name: impl Into<String>,
        date: NaiveDate,
        price: Decimal,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        let item_name = item_name.into();
        if item_name.trim().is_empty() {
            return Err(DomainError::invalid_input("purchase item_name must not be empty"));
        }
        if quantity == 0 {
            return Err(DomainError::invalid_input(format!(
                "purchase quantity for `{item_name}` must be at least 1"
            )));
        }
        if price.is_sign_negative() {
            return Err(DomainError::invalid_input(format!(
                "purchase price for `{item_name}` must not be negative"
            )));
        }

        Ok(Self { item_name, date, price, quantity })
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.price / Decimal::from(self.quantity)
    }
}

/// Ascending purchase dates of one item for one customer.
///
/// Same-day repeats are kept and show up as zero-length intervals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ItemHistory {
    dates: Vec<NaiveDate>,
}

impl ItemHistory {
    pub fn new(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort_unstable();
        Self { dates }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Day gaps between consecutive purchases; `len() - 1` entries.
    pub fn intervals(&self) -> Vec<f64> {
        self.dates.windows(2).map(|pair| (pair[1] - pair[0]).num_days() as f64).collect()
    }
}

impl FromIterator<NaiveDate> for ItemHistory {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Splits a customer's purchase events into one history per item name.
pub fn group_histories(events: &[PurchaseEvent]) -> BTreeMap<String, ItemHistory> {
    let mut grouped: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();
    for event in events {
        grouped.entry(event.item_name.clone()).or_default().push(event.date);
    }

    grouped.into_iter().map(|(name, dates)| (name, ItemHistory::new(dates))).collect()
}

/// Quantity-weighted average unit price per item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBook {
    prices: BTreeMap<String, Decimal>,
}

impl PriceBook {
    pub fn from_events(events: &[PurchaseEvent]) -> Self {
        let mut totals: BTreeMap<&str, (Decimal, u64)> = BTreeMap::new();
        for event in events {
            let entry = totals.entry(event.item_name.as_str()).or_insert((Decimal::ZERO, 0));
            entry.0 += event.price;
            entry.1 += u64::from(event.quantity);
        }

        let prices = totals
            .into_iter()
            .filter_map(|(name, (spent, units))| {
                spent.checked_div(Decimal::from(units)).map(|avg| (name.to_string(), avg))
            })
            .collect();

        Self { prices }
    }

    pub fn insert(&mut self, item_name: impl Into<String>, unit_price: Decimal) {
        self.prices.insert(item_name.into(), unit_price);
    }

    pub fn unit_price(&self, item_name: &str) -> Option<Decimal> {
        self.prices.get(item_name).copied()
    }
}
