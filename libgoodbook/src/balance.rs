//! Transaction settlement and balance accumulation.
//!
//! Everything here is a pure function of its input: balances are always
//! accumulated into a fresh [`Balances`], so computing them again over the
//! same transactions, or over a month worth of them, gives consistent results.

use crate::amount::Amount;
use crate::transaction::{Entry, Transaction};
use crate::ParseError;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::debug;

use std::collections::BTreeMap;

/// Currency to total, in the order currencies were first seen.
pub type Balance = IndexMap<String, Decimal>;

/// Add every currency of `rhs` into `lhs`.
///
/// Only used for display totals, so a sum past the decimal range sticks at
/// `Decimal::MAX` or `Decimal::MIN` instead of failing.
pub fn merge(lhs: &mut Balance, rhs: &Balance) {
    for (currency, nominal) in rhs {
        let total = lhs.entry(currency.clone()).or_default();
        *total = saturating_add(*total, *nominal);
    }
}

fn saturating_add(lhs: Decimal, rhs: Decimal) -> Decimal {
    lhs.checked_add(rhs).unwrap_or(if rhs.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// True if the balance is zero in every currency, or holds none.
pub fn is_zero(balance: &Balance) -> bool {
    balance.values().all(|nominal| nominal.is_zero())
}

/// Per account balances, ordered by account path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Balances {
    accounts: BTreeMap<String, Balance>,
}

impl Balances {
    pub fn new() -> Self {
        Default::default()
    }

    /// Make sure the account shows up, even without anything posted to it.
    pub fn register(&mut self, account: &str) -> &mut Balance {
        self.accounts.entry(account.to_string()).or_default()
    }

    /// Add `amount` to `account`. `line` is blamed if the total overflows.
    pub fn post(&mut self, account: &str, amount: &Amount, line: usize) -> Result<(), ParseError> {
        let total = self
            .register(account)
            .entry(amount.currency.clone())
            .or_default();
        *total = total
            .checked_add(amount.nominal)
            .ok_or(ParseError::AmountOverflow { line })?;
        Ok(())
    }

    pub fn get(&self, account: &str) -> Option<&Balance> {
        self.accounts.get(account)
    }

    /// Balance of `account` in `currency`, zero if never posted.
    pub fn of(&self, account: &str, currency: &str) -> Decimal {
        self.accounts
            .get(account)
            .and_then(|balance| balance.get(currency))
            .copied()
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Balance)> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum over all accounts, zero in every currency for a valid ledger.
    pub fn total(&self) -> Balance {
        let mut total = Balance::new();
        for balance in self.accounts.values() {
            merge(&mut total, balance);
        }
        total
    }
}

/// Running total of one currency inside a transaction,
/// with the line of the last entry that touched it.
struct Residual {
    nominal: Decimal,
    line: usize,
}

/// Check that `txn` balances and fill in its omitted entry, if any.
///
/// The omitted entry takes the negated residual of the first unbalanced
/// currency. Every other unbalanced currency is appended as a new entry for
/// the same account and line. A transaction with nothing left to infer comes
/// back unchanged.
pub fn settle(txn: &Transaction) -> Result<Transaction, ParseError> {
    let mut residuals: IndexMap<&str, Residual> = IndexMap::new();
    let mut omitted: Option<usize> = None;

    for (idx, entry) in txn.entries.iter().enumerate() {
        match &entry.amount {
            Some(amount) => {
                let residual = residuals
                    .entry(amount.currency.as_str())
                    .or_insert(Residual {
                        nominal: Decimal::ZERO,
                        line: entry.line,
                    });
                residual.nominal = residual
                    .nominal
                    .checked_add(amount.nominal)
                    .ok_or(ParseError::AmountOverflow { line: entry.line })?;
                residual.line = entry.line;
            }
            None if omitted.is_some() => {
                return Err(ParseError::MultipleOmittedAmounts { line: entry.line })
            }
            None => omitted = Some(idx),
        }
    }

    let unbalanced = residuals
        .into_iter()
        .filter(|(_, residual)| !residual.nominal.is_zero());

    let mut entries = txn.entries.clone();
    match omitted {
        Some(idx) => {
            let account = txn.entries[idx].account.clone();
            let line = txn.entries[idx].line;
            for (currency, residual) in unbalanced {
                let amount = Amount::new(-residual.nominal, currency);
                if entries[idx].amount.is_none() {
                    entries[idx].amount = Some(amount);
                } else {
                    entries.push(Entry::new(account.clone(), Some(amount), line));
                }
            }
        }
        None => {
            if let Some((currency, residual)) = unbalanced.into_iter().next() {
                return Err(ParseError::Unbalanced {
                    line: residual.line,
                    currency: currency.to_string(),
                    residual: residual.nominal,
                });
            }
        }
    }

    Ok(Transaction {
        date: txn.date,
        description: txn.description.clone(),
        entries,
        line: txn.line,
    })
}

/// Settle every transaction and sum the results per account.
pub fn compute_balances<'a, I>(transactions: I) -> Result<Balances, ParseError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut balances = Balances::new();
    let mut count = 0usize;

    for txn in transactions {
        let settled = settle(txn)?;
        for entry in &settled.entries {
            match &entry.amount {
                Some(amount) => balances.post(&entry.account, amount, entry.line)?,
                None => {
                    balances.register(&entry.account);
                }
            }
        }
        count += 1;
    }

    debug!(
        transactions = count,
        accounts = balances.len(),
        "computed balances"
    );
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use crate::amount::Amount;
    use crate::balance::{compute_balances, is_zero, merge, settle, Balance, Balances};
    use crate::transaction::{Entry, Transaction};
    use crate::ParseError;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use anyhow::{anyhow, Result};

    fn txn(entries: Vec<Entry>) -> Result<Transaction> {
        Ok(Transaction {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?,
            description: "Coffee".to_string(),
            entries,
            line: 1,
        })
    }

    fn yen(account: &str, nominal: Decimal, line: usize) -> Entry {
        Entry::new(account, Some(Amount::new(nominal, "¥")), line)
    }

    #[test]
    fn infer_omitted_amount() -> Result<()> {
        let coffee = txn(vec![
            yen("Expenses:Food", dec!(10.00), 2),
            Entry::new("Assets:Cash", None, 3),
        ])?;

        let settled = settle(&coffee)?;
        assert_eq!(
            settled.entries[1],
            Entry::new("Assets:Cash", Some(Amount::new(dec!(-10.00), "¥")), 3)
        );

        let balances = compute_balances([&coffee])?;
        assert_eq!(balances.of("Assets:Cash", "¥"), dec!(-10.00));
        assert_eq!(balances.of("Expenses:Food", "¥"), dec!(10.00));
        Ok(())
    }

    #[test]
    fn infer_multi_currency() -> Result<()> {
        let trip = txn(vec![
            yen("Expenses:Food", dec!(10), 2),
            Entry::new("Expenses:Hotel", Some(Amount::new(dec!(30.50), "$")), 3),
            Entry::new("Assets:Wallet", None, 4),
        ])?;

        let settled = settle(&trip)?;
        assert_eq!(settled.entries.len(), 4);
        assert_eq!(
            settled.entries[2],
            Entry::new("Assets:Wallet", Some(Amount::new(dec!(-10), "¥")), 4)
        );
        assert_eq!(
            settled.entries[3],
            Entry::new("Assets:Wallet", Some(Amount::new(dec!(-30.50), "$")), 4)
        );

        let balances = compute_balances([&trip])?;
        assert_eq!(balances.of("Assets:Wallet", "¥"), dec!(-10));
        assert_eq!(balances.of("Assets:Wallet", "$"), dec!(-30.50));
        assert!(is_zero(&balances.total()));
        Ok(())
    }

    #[test]
    fn detect_unbalanced() -> Result<()> {
        let broken = txn(vec![yen("A", dec!(10.00), 2), yen("B", dec!(5.00), 3)])?;
        assert_eq!(
            settle(&broken).unwrap_err(),
            ParseError::Unbalanced {
                line: 3,
                currency: "¥".to_string(),
                residual: dec!(15.00),
            }
        );
        Ok(())
    }

    #[test]
    fn detect_second_omission() -> Result<()> {
        let broken = txn(vec![
            yen("Expenses:Food", dec!(10), 2),
            Entry::new("Assets:Cash", None, 3),
            Entry::new("Assets:Bank", None, 4),
        ])?;
        assert_eq!(
            compute_balances([&broken]).unwrap_err(),
            ParseError::MultipleOmittedAmounts { line: 4 }
        );
        Ok(())
    }

    #[test]
    fn balanced_omission_stays_empty() -> Result<()> {
        let swap = txn(vec![
            yen("Assets:Cash", dec!(-5), 2),
            yen("Assets:Bank", dec!(5), 3),
            Entry::new("Equity:Void", None, 4),
        ])?;
        let settled = settle(&swap)?;
        assert_eq!(settled, swap);

        let balances = compute_balances([&swap])?;
        assert_eq!(balances.get("Equity:Void").map(|b| b.len()), Some(0));
        Ok(())
    }

    #[test]
    fn recompute_is_idempotent() -> Result<()> {
        let coffee = txn(vec![
            yen("Expenses:Food", dec!(10.00), 2),
            Entry::new("Assets:Cash", None, 3),
        ])?;
        let settled = settle(&coffee)?;

        let first = compute_balances([&coffee])?;
        let second = compute_balances([&coffee])?;
        let from_settled = compute_balances([&settled])?;
        assert_eq!(first, second);
        assert_eq!(first, from_settled);
        assert_ne!(first, Balances::new());
        Ok(())
    }

    #[test]
    fn residual_overflow_is_an_error() -> Result<()> {
        let huge = txn(vec![
            yen("A", Decimal::MAX, 2),
            yen("B", Decimal::MAX, 3),
            Entry::new("C", None, 4),
        ])?;
        assert_eq!(
            settle(&huge).unwrap_err(),
            ParseError::AmountOverflow { line: 3 }
        );
        Ok(())
    }

    #[test]
    fn account_total_overflow_is_an_error() -> Result<()> {
        let first = txn(vec![
            yen("Assets:Vault", Decimal::MAX, 2),
            Entry::new("Equity:Opening", None, 3),
        ])?;
        let second = txn(vec![
            yen("Assets:Vault", Decimal::MAX, 6),
            Entry::new("Equity:Opening", None, 7),
        ])?;
        assert!(compute_balances([&first]).is_ok());
        assert_eq!(
            compute_balances([&first, &second]).unwrap_err(),
            ParseError::AmountOverflow { line: 6 }
        );
        Ok(())
    }

    #[test]
    fn merge_saturates() {
        let mut total: Balance = [("¥".to_string(), Decimal::MAX)].into_iter().collect();
        let more: Balance = [("¥".to_string(), dec!(1)), ("$".to_string(), dec!(2))]
            .into_iter()
            .collect();
        merge(&mut total, &more);
        assert_eq!(total.get("¥"), Some(&Decimal::MAX));
        assert_eq!(total.get("$"), Some(&dec!(2)));

        let mut debt: Balance = [("¥".to_string(), Decimal::MIN)].into_iter().collect();
        let less: Balance = [("¥".to_string(), dec!(-1))].into_iter().collect();
        merge(&mut debt, &less);
        assert_eq!(debt.get("¥"), Some(&Decimal::MIN));
    }
}
