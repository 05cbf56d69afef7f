//! Goodbook - A plain text, indentation delimited double-entry ledger parser
//! ---
//!
//! A ledger is a list of transactions. Each transaction starts with an unindented
//! header line carrying a date and a description, followed by indented entry lines:
//!
//! ```text
//! 2020-01-01 Coffee
//!   Expenses:Food   ¥10.00
//!   Assets:Cash
//! ```
//!
//! Every transaction must balance to zero per currency. At most one entry per
//! transaction may leave its amount out, and it will absorb whatever is left.
//!

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Account paths and the account hierarchy, e.g. `Assets:Bank:Jawir`.
///
/// The main structure is [`AccountNode`][account::AccountNode], which folds flat
/// per-account balances into a tree where each node holds its whole subtree total.
/// Siblings are ordered for display by [`CurrencyWeights`][account::CurrencyWeights].
pub mod account;

pub mod amount;
pub mod balance;
pub mod filter;
/// Ledger representation.
pub mod ledger;

/// Our main parser entrypoints.
pub mod parser;

pub mod transaction;

pub use parser::parse;

use rust_decimal::Decimal;
use thiserror::Error;

/// Everything that makes a ledger unacceptable.
/// Each variant carries the line number that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Indented line showing up before any transaction header.
    #[error("line {line}: invalid entry indentation")]
    MalformedLedger { line: usize },

    #[error("line {line}: invalid date")]
    InvalidDate { line: usize },

    #[error("line {line}: transaction has no entries")]
    EmptyTransaction { line: usize },

    /// Amount without currency.
    #[error("line {line}: invalid entry, amount has no currency")]
    InvalidEntry { line: usize },

    #[error("line {line}: only 1 entry can have its amount omitted")]
    MultipleOmittedAmounts { line: usize },

    #[error("line {line}: transaction does not balance, residual {currency}{residual}")]
    Unbalanced {
        line: usize,
        currency: String,
        residual: Decimal,
    },

    /// Summing amounts went past what a decimal can hold.
    #[error("line {line}: amount overflows")]
    AmountOverflow { line: usize },
}

impl ParseError {
    /// The source line this error points at.
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedLedger { line }
            | ParseError::InvalidDate { line }
            | ParseError::EmptyTransaction { line }
            | ParseError::InvalidEntry { line }
            | ParseError::MultipleOmittedAmounts { line }
            | ParseError::AmountOverflow { line }
            | ParseError::Unbalanced { line, .. } => *line,
        }
    }
}
