use libgoodbook::account::{AccountNode, CurrencyWeights};
use libgoodbook::balance::{Balance, Balances};
use libgoodbook::ledger::Ledger;
use libgoodbook::transaction::Transaction;

use std::io::{self, Write};

/// How balance reports are laid out.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub weights: CurrencyWeights,
    /// Spaces per hierarchy level.
    pub indent: usize,
    pub flat: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            weights: CurrencyWeights::default(),
            indent: 2,
            flat: false,
        }
    }
}

/// Nonzero currencies of a balance, e.g. `¥-10.00 $3.50`.
fn format_balance(balance: &Balance) -> String {
    balance
        .iter()
        .filter(|(_, nominal)| !nominal.is_zero())
        .map(|(currency, nominal)| format!("{}{}", currency, nominal))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn write_balances<W: Write>(
    out: &mut W,
    balances: &Balances,
    config: &ReportConfig,
) -> io::Result<()> {
    if config.flat {
        write_flat(out, balances)
    } else {
        write_hierarchy(out, &AccountNode::build(balances), config)
    }
}

fn write_flat<W: Write>(out: &mut W, balances: &Balances) -> io::Result<()> {
    let rows: Vec<(&String, String)> = balances
        .iter()
        .map(|(account, balance)| (account, format_balance(balance)))
        .filter(|(_, formatted)| !formatted.is_empty())
        .collect();
    let width = rows
        .iter()
        .map(|(account, _)| account.chars().count())
        .max()
        .unwrap_or(0);

    for (account, formatted) in rows {
        let pad = width - account.chars().count();
        writeln!(out, "{}{}  {}", account, " ".repeat(pad), formatted)?;
    }
    Ok(())
}

fn write_hierarchy<W: Write>(
    out: &mut W,
    root: &AccountNode,
    config: &ReportConfig,
) -> io::Result<()> {
    for row in root.rows(&config.weights) {
        writeln!(
            out,
            "{}{}  {}",
            " ".repeat(row.depth * config.indent),
            row.name,
            format_balance(row.balance)
        )?;
    }
    Ok(())
}

pub fn write_monthly<W: Write>(
    out: &mut W,
    monthly: &[(&str, Balances)],
    config: &ReportConfig,
) -> io::Result<()> {
    for (idx, (month, balances)) in monthly.iter().enumerate() {
        if idx > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}", month)?;
        write_balances(out, balances, config)?;
    }
    Ok(())
}

pub fn write_transaction<W: Write>(out: &mut W, txn: &Transaction) -> io::Result<()> {
    writeln!(out, "{} {}", txn.date.format("%Y-%m-%d"), txn.description)?;
    for entry in &txn.entries {
        match &entry.amount {
            Some(amount) => writeln!(out, "  {}  {}", entry.account, amount)?,
            None => writeln!(out, "  {}", entry.account)?,
        }
    }
    Ok(())
}

pub fn write_transactions<'a, W, I>(out: &mut W, transactions: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Transaction>,
{
    for (idx, txn) in transactions.into_iter().enumerate() {
        if idx > 0 {
            writeln!(out)?;
        }
        write_transaction(out, txn)?;
    }
    Ok(())
}

/// Every transaction of the ledger, in source order.
pub fn write_ledger<W: Write>(out: &mut W, ledger: &Ledger) -> io::Result<()> {
    write_transactions(out, ledger.transactions())
}
