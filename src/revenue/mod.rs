//! Monthly revenue aggregation
//!
//! Pure bucketing of an already-scoped payment collection into the twelve
//! calendar months of one year. Months are derived from each payment's
//! `created_at` in UTC, and sums use exact decimal addition, so the same
//! input always yields the same output regardless of where it runs.

use crate::core::error::{LedgerError, LedgerResult};
use crate::core::money::Amount;
use crate::entities::Payment;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeSet;

pub const MONTHS_PER_YEAR: usize = 12;

/// Revenue of one calendar year, bucketed by month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    /// The year the buckets belong to
    pub year: i32,

    /// January..December totals
    pub months: [Amount; MONTHS_PER_YEAR],

    /// Sum of `months`
    pub total: Amount,

    /// Every year with at least one payment in the input, newest first
    pub available_years: Vec<i32>,
}

impl MonthlyRevenue {
    /// Total of a month, 1-based (`1` = January)
    pub fn month(&self, month: u32) -> Option<Amount> {
        let index = usize::try_from(month).ok()?.checked_sub(1)?;
        self.months.get(index).copied()
    }
}

/// Bucket `payments` into the months of `year`
///
/// `available_years` is computed over the whole input, not only `year`, so
/// a caller can offer every year its scope contains.
pub fn aggregate_monthly(payments: &[Payment], year: i32) -> LedgerResult<MonthlyRevenue> {
    let mut months = [Amount::zero(); MONTHS_PER_YEAR];
    let mut years = BTreeSet::new();

    for payment in payments {
        let created = payment.created_at;
        years.insert(created.year());

        if created.year() != year {
            continue;
        }

        let bucket = &mut months[created.month0() as usize];
        *bucket = bucket
            .checked_add(payment.amount)
            .ok_or_else(|| overflow(year))?;
    }

    let total = months
        .iter()
        .try_fold(Amount::zero(), |acc, month| acc.checked_add(*month))
        .ok_or_else(|| overflow(year))?;

    Ok(MonthlyRevenue {
        year,
        months,
        total,
        available_years: years.into_iter().rev().collect(),
    })
}

fn overflow(year: i32) -> LedgerError {
    LedgerError::Internal(format!("revenue total for {} exceeds decimal range", year))
}
