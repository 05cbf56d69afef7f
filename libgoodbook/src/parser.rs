use crate::ledger::Ledger;
use crate::ParseError;

use tracing::trace;

#[derive(Parser)]
#[grammar = "goodbook.pest"]
pub struct LedgerParser;

/// A trimmed source line with its 1-based line number.
pub type Line<'s> = (usize, &'s str);

/// Parses ledger input as string slice, we are not concerning ourselves
/// with file input, so reading from files will need to be handled by the client code.
pub fn parse(input: &str) -> Result<Ledger, ParseError> {
    Ledger::parse(input)
}

/// Split ledger text into line groups, one per transaction.
///
/// Blank lines are skipped. An unindented line opens a new group, an indented
/// line goes to the latest group, and it is an error if there is none yet.
pub fn split(input: &str) -> Result<Vec<Vec<Line<'_>>>, ParseError> {
    let (groups, errors) = split_lenient(input);
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(groups),
    }
}

/// Like [`split`], but keeps going past stray indented lines,
/// returning them as errors next to whatever could be grouped.
pub fn split_lenient(input: &str) -> (Vec<Vec<Line<'_>>>, Vec<ParseError>) {
    let mut groups: Vec<Vec<Line<'_>>> = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line_number = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let indent = raw.len() - raw.trim_start().len();
        if indent == 0 {
            groups.push(vec![(line_number, line)]);
        } else if let Some(group) = groups.last_mut() {
            group.push((line_number, line));
        } else {
            errors.push(ParseError::MalformedLedger { line: line_number });
        }
    }

    trace!(groups = groups.len(), errors = errors.len(), "split ledger");
    (groups, errors)
}
