use crate::amount::{Amount, ParsedAmount};
use crate::parser::{LedgerParser, Line, Rule};
use crate::ParseError;

use chrono::{Datelike, NaiveDate};
use pest::Parser;
use tracing::trace;

#[derive(Debug, PartialEq)]
pub struct TxnHeader<'th> {
    pub(crate) date: NaiveDate,
    pub(crate) description: &'th str,
}

impl<'th> TxnHeader<'th> {
    pub fn parse((line, text): Line<'th>) -> Result<TxnHeader<'th>, ParseError> {
        let invalid = || ParseError::InvalidDate { line };
        let header = LedgerParser::parse(Rule::header, text)
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)?;

        let mut year = None;
        let mut month = None;
        let mut day = None;
        let mut description = "";
        for pair in header.into_inner() {
            match pair.as_rule() {
                Rule::year => year = Some(pair.as_str()),
                Rule::month => month = Some(pair.as_str()),
                Rule::day => day = Some(pair.as_str()),
                Rule::description => description = pair.as_str().trim(),
                _ => {}
            }
        }

        let date = match (year, month, day) {
            (Some(y), Some(m), Some(d)) => date_from_digits(y, m, d).ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };

        Ok(TxnHeader { date, description })
    }
}

/// Build a date out of three digit runs. The year keeps the two digits
/// following its first two once padded to four, month and day keep their
/// first two once padded to two. Two digit years pivot at 69 like `%y`.
fn date_from_digits(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year = format!("{:0>4}", year);
    let month = format!("{:0>2}", month);
    let day = format!("{:0>2}", day);

    let yy: i32 = year.get(2..4)?.parse().ok()?;
    let mm: u32 = month.get(..2)?.parse().ok()?;
    let dd: u32 = day.get(..2)?.parse().ok()?;
    let year = if yy < 69 { 2000 + yy } else { 1900 + yy };

    NaiveDate::from_ymd_opt(year, mm, dd)
}

#[derive(Debug, PartialEq)]
pub struct ParsedEntry<'s> {
    pub(crate) line: usize,
    pub(crate) account: &'s str,
    pub(crate) amount: Option<ParsedAmount<'s>>,
}

impl<'s> ParsedEntry<'s> {
    pub fn parse((line, text): Line<'s>) -> Result<ParsedEntry<'s>, ParseError> {
        let invalid = || ParseError::InvalidEntry { line };
        let entry = LedgerParser::parse(Rule::entry, text)
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)?;

        let mut account = None;
        let mut amount = None;
        for pair in entry.into_inner() {
            match pair.as_rule() {
                Rule::account => account = Some(pair.as_str().trim()),
                Rule::posting | Rule::amount => amount = Some(ParsedAmount::parse(pair, line)?),
                _ => {}
            }
        }

        Ok(ParsedEntry {
            line,
            account: account.ok_or_else(invalid)?,
            amount,
        })
    }
}

/// One account line of a transaction.
/// `amount` is `None` for the entry whose amount is left for the ledger to infer.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub account: String,
    pub amount: Option<Amount>,
    pub line: usize,
}

impl Entry {
    pub fn new(account: impl Into<String>, amount: Option<Amount>, line: usize) -> Self {
        Self {
            account: account.into(),
            amount,
            line,
        }
    }

    pub fn is_omitted(&self) -> bool {
        self.amount.is_none()
    }
}

impl From<&ParsedEntry<'_>> for Entry {
    fn from(parsed: &ParsedEntry<'_>) -> Self {
        Entry::new(
            parsed.account,
            parsed.amount.as_ref().map(Amount::from),
            parsed.line,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub entries: Vec<Entry>,
    /// Line of the header.
    pub line: usize,
}

impl Transaction {
    /// Parse a line group as produced by [`split`][crate::parser::split].
    /// The first line is the header, every other line is an entry.
    ///
    /// `split` never yields an empty group. One passed in directly has no line
    /// to point at, and fails with `EmptyTransaction` at line 0.
    pub fn parse(group: &[Line<'_>]) -> Result<Transaction, ParseError> {
        let (&first, rest) = group
            .split_first()
            .ok_or(ParseError::EmptyTransaction { line: 0 })?;
        let header = TxnHeader::parse(first)?;
        if rest.is_empty() {
            return Err(ParseError::EmptyTransaction { line: first.0 });
        }

        let mut entries = Vec::with_capacity(rest.len());
        for &line in rest {
            let parsed = ParsedEntry::parse(line)?;
            trace!(line = parsed.line, account = parsed.account, "entry");
            entries.push(Entry::from(&parsed));
        }

        Ok(Transaction {
            date: header.date,
            description: header.description.to_string(),
            entries,
            line: first.0,
        })
    }

    /// `YYYY-MM` bucket this transaction falls in.
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.date.year(), self.date.month())
    }
}
