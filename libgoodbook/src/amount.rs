use crate::parser::Rule;
use crate::ParseError;
use pest::iterators::Pair;
use rust_decimal::Decimal;

use std::fmt;
use std::str::FromStr;

/// Amount as it appears on the entry line, borrowing from the source text.
#[derive(Debug, PartialEq)]
pub struct ParsedAmount<'s> {
    pub(crate) nominal: Decimal,
    pub(crate) currency: &'s str,
}

impl<'a> ParsedAmount<'a> {
    /// Parse a `posting` token, `line` is only used for error reporting.
    /// A bare `amount` token means the currency is missing.
    pub fn parse(token: Pair<'a, Rule>, line: usize) -> Result<ParsedAmount<'a>, ParseError> {
        match token.as_rule() {
            Rule::posting => {
                let mut pairs = token.into_inner();
                let currency = pairs
                    .next()
                    .ok_or(ParseError::InvalidEntry { line })?
                    .as_str();
                let nominal = pairs
                    .next()
                    .ok_or(ParseError::InvalidEntry { line })?
                    .as_str();
                Ok(Self {
                    nominal: parse_decimal(nominal).ok_or(ParseError::InvalidEntry { line })?,
                    currency,
                })
            }
            _ => Err(ParseError::InvalidEntry { line }),
        }
    }

    pub fn nominal(&self) -> Decimal {
        self.nominal
    }

    pub fn currency(&self) -> &str {
        self.currency
    }
}

/// `Decimal` does not take `10.` or `-.5`, spell those out before parsing.
/// Numbers that only fit by rounding are rejected.
fn parse_decimal(s: &str) -> Option<Decimal> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let digits = digits.strip_suffix('.').unwrap_or(digits);
    let normalized = if digits.starts_with('.') {
        format!("{}0{}", sign, digits)
    } else {
        format!("{}{}", sign, digits)
    };
    let value = Decimal::from_str(&normalized).ok()?;
    (significant(&normalized) == significant(&value.to_string())).then_some(value)
}

/// Digits that matter in a plain decimal string: no leading zeros in the
/// integer part, no trailing zeros in the fraction, no sign on zero.
fn significant(s: &str) -> String {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    match (int.is_empty(), frac.is_empty()) {
        (true, true) => "0".to_string(),
        (_, true) => format!("{}{}", sign, int),
        (true, false) => format!("{}0.{}", sign, frac),
        (false, false) => format!("{}{}.{}", sign, int, frac),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Amount {
    pub nominal: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(nominal: Decimal, currency: impl Into<String>) -> Self {
        Self {
            nominal,
            currency: currency.into(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.nominal.is_zero()
    }
}

impl From<&ParsedAmount<'_>> for Amount {
    fn from(parsed: &ParsedAmount<'_>) -> Self {
        Amount::new(parsed.nominal, parsed.currency)
    }
}

impl std::ops::Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount {
            nominal: -self.nominal,
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency, self.nominal)
    }
}
