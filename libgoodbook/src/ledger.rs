use crate::{
    account::AccountNode,
    balance::{compute_balances, settle, Balances},
    filter::TransactionFilter,
    parser::{split, split_lenient},
    transaction::Transaction,
    ParseError,
};

use tracing::debug;

use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    months: BTreeMap<String, Vec<usize>>,
    balances: Balances,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger {
            transactions: Vec::new(),
            months: BTreeMap::new(),
            balances: Balances::new(),
        }
    }

    /// Parse and validate a whole ledger. The first problem found aborts,
    /// nothing partial is returned.
    pub fn parse(input: &str) -> Result<Ledger, ParseError> {
        let mut ledger = Ledger::new();
        for group in split(input)? {
            ledger.push(Transaction::parse(&group)?);
        }

        let settled = ledger
            .transactions
            .iter()
            .map(settle)
            .collect::<Result<Vec<_>, _>>()?;
        ledger.balances = compute_balances(&settled)?;
        ledger.transactions = settled;

        debug!(
            transactions = ledger.transactions.len(),
            months = ledger.months.len(),
            accounts = ledger.balances.len(),
            "parsed ledger"
        );
        Ok(ledger)
    }

    /// Collect every problem in `input` instead of stopping at the first,
    /// ordered by line. Empty means the ledger is fine.
    pub fn check(input: &str) -> Vec<ParseError> {
        let (groups, mut errors) = split_lenient(input);
        let mut settled = Vec::new();
        for group in groups {
            match Transaction::parse(&group).and_then(|txn| settle(&txn)) {
                Ok(txn) => settled.push(txn),
                Err(err) => errors.push(err),
            }
        }
        if let Err(err) = compute_balances(&settled) {
            errors.push(err);
        }
        errors.sort_by_key(ParseError::line);
        errors
    }

    fn push(&mut self, txn: Transaction) {
        self.months
            .entry(txn.month_key())
            .or_default()
            .push(self.transactions.len());
        self.transactions.push(txn);
    }

    /// Transactions in source order, with omitted amounts filled in.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn hierarchy(&self) -> AccountNode {
        AccountNode::build(&self.balances)
    }

    /// `YYYY-MM` keys, ascending.
    pub fn months(&self) -> impl Iterator<Item = &str> {
        self.months.keys().map(String::as_str)
    }

    pub fn month(&self, key: &str) -> Vec<&Transaction> {
        self.months
            .get(key)
            .map(|idxs| idxs.iter().map(|&idx| &self.transactions[idx]).collect())
            .unwrap_or_default()
    }

    /// Balances recomputed from the month's own transactions.
    pub fn month_balances(&self, key: &str) -> Result<Balances, ParseError> {
        compute_balances(self.month(key))
    }

    /// Balances of every month, ascending.
    pub fn monthly_balances(&self) -> Result<Vec<(&str, Balances)>, ParseError> {
        self.months()
            .map(|key| self.month_balances(key).map(|balances| (key, balances)))
            .collect()
    }

    pub fn filter<F: TransactionFilter + ?Sized>(&self, filter: &F) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|txn| filter.matches(txn))
            .collect()
    }
}
