use std::collections::BTreeSet;
use tracing::debug;

use crate::records::Transaction;

/// Optional narrowing applied after validation. Each bound is enforced only
/// when present; a present bound of zero is still a bound.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterCriteria {
    pub region: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.min_amount.is_none() && self.max_amount.is_none()
    }

    fn has_amount_bounds(&self) -> bool {
        self.min_amount.is_some() || self.max_amount.is_some()
    }

    fn amount_in_range(&self, amount: f64) -> bool {
        self.min_amount.map_or(true, |min| amount >= min)
            && self.max_amount.map_or(true, |max| amount <= max)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterSummary {
    pub total_input: usize,
    pub invalid: usize,
    pub filtered_by_region: usize,
    pub filtered_by_amount: usize,
    pub final_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TransactionId,
    ProductId,
    CustomerId,
    NonPositiveAmount,
    NonFiniteAmount,
    MissingRegion,
}

/// Returns the first rule the transaction breaks, if any.
pub fn check(t: &Transaction) -> Option<Rejection> {
    if !t.transaction_id.starts_with('T') {
        return Some(Rejection::TransactionId);
    }
    if !t.product_id.starts_with('P') {
        return Some(Rejection::ProductId);
    }
    if !t.customer_id.starts_with('C') {
        return Some(Rejection::CustomerId);
    }
    if t.quantity <= 0 || t.unit_price.is_nan() || t.unit_price <= 0.0 {
        return Some(Rejection::NonPositiveAmount);
    }
    if !t.unit_price.is_finite() || !t.amount().is_finite() {
        return Some(Rejection::NonFiniteAmount);
    }
    if t.region.is_empty() {
        return Some(Rejection::MissingRegion);
    }
    None
}

pub fn validate_and_filter(
    transactions: Vec<Transaction>,
    criteria: &FilterCriteria,
) -> (Vec<Transaction>, usize, FilterSummary) {
    let total_input = transactions.len();
    let mut invalid = 0;
    let mut valid = Vec::with_capacity(total_input);

    for t in transactions {
        match check(&t) {
            Some(reason) => {
                debug!(transaction = %t.transaction_id, ?reason, "rejected transaction");
                invalid += 1;
            }
            None => valid.push(t),
        }
    }

    let valid_count = valid.len();

    let by_region: Vec<Transaction> = match &criteria.region {
        Some(region) => valid.into_iter().filter(|t| &t.region == region).collect(),
        None => valid,
    };
    let filtered_by_region = valid_count - by_region.len();

    let after_region = by_region.len();
    let filtered: Vec<Transaction> = if criteria.has_amount_bounds() {
        by_region
            .into_iter()
            .filter(|t| criteria.amount_in_range(t.amount()))
            .collect()
    } else {
        by_region
    };
    let filtered_by_amount = after_region - filtered.len();

    let summary = FilterSummary {
        total_input,
        invalid,
        filtered_by_region,
        filtered_by_amount,
        final_count: filtered.len(),
    };

    (filtered, invalid, summary)
}

/// What the operator is shown before choosing filters.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub amount_range: Option<(f64, f64)>,
}

pub fn filter_options(transactions: &[Transaction]) -> FilterOptions {
    let regions: BTreeSet<&str> = transactions
        .iter()
        .map(|t| t.region.as_str())
        .filter(|r| !r.is_empty())
        .collect();

    let amount_range = transactions.iter().map(Transaction::amount).fold(
        None,
        |range: Option<(f64, f64)>, amount| match range {
            None => Some((amount, amount)),
            Some((lo, hi)) => Some((lo.min(amount), hi.max(amount))),
        },
    );

    FilterOptions {
        regions: regions.into_iter().map(str::to_owned).collect(),
        amount_range,
    }
}
