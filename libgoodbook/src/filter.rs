//! Transaction predicates for selective reports.

use crate::account::segments;
use crate::transaction::Transaction;

use rust_decimal::Decimal;

pub trait TransactionFilter {
    fn matches(&self, txn: &Transaction) -> bool;
}

impl<F> TransactionFilter for F
where
    F: Fn(&Transaction) -> bool,
{
    fn matches(&self, txn: &Transaction) -> bool {
        self(txn)
    }
}

/// Matches transactions with any entry booked under an account having
/// `keyword` as one of its segments, in `currency`, above `threshold`.
#[derive(Clone, Debug, PartialEq)]
pub struct LargeExpense {
    pub keyword: String,
    pub currency: String,
    pub threshold: Decimal,
}

impl LargeExpense {
    pub fn new(keyword: impl Into<String>, currency: impl Into<String>, threshold: Decimal) -> Self {
        Self {
            keyword: keyword.into(),
            currency: currency.into(),
            threshold,
        }
    }
}

impl TransactionFilter for LargeExpense {
    fn matches(&self, txn: &Transaction) -> bool {
        txn.entries.iter().any(|entry| {
            let Some(amount) = &entry.amount else {
                return false;
            };
            amount.currency == self.currency
                && amount.nominal > self.threshold
                && segments(&entry.account).contains(&self.keyword.as_str())
        })
    }
}
