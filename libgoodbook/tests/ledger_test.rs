use libgoodbook::account::CurrencyWeights;
use libgoodbook::amount::Amount;
use libgoodbook::filter::LargeExpense;
use libgoodbook::transaction::Entry;
use libgoodbook::ParseError;
use rust_decimal_macros::dec;

use anyhow::{anyhow, Result};

#[test]
fn blank_ledger_has_no_transactions() -> Result<()> {
    let ledger = libgoodbook::parse("\n\n   \n")?;
    assert!(ledger.transactions().is_empty());
    assert!(ledger.balances().is_empty());
    assert_eq!(ledger.months().count(), 0);
    Ok(())
}

#[test]
fn indented_first_line() {
    assert_eq!(
        libgoodbook::parse("\n  Expenses:Food ¥10.00\n").unwrap_err(),
        ParseError::MalformedLedger { line: 2 }
    );
}

#[test]
fn coffee() -> Result<()> {
    let ledger = libgoodbook::parse("2020-01-01 Coffee\n  Expenses:Food ¥10.00\n  Assets:Cash\n")?;
    assert_eq!(ledger.balances().of("Assets:Cash", "¥"), dec!(-10.00));
    assert_eq!(ledger.balances().of("Expenses:Food", "¥"), dec!(10.00));
    assert_eq!(ledger.transactions()[0].description, "Coffee");
    Ok(())
}

#[test]
fn omitted_entry_across_currencies() -> Result<()> {
    let ledger = libgoodbook::parse(
        "2020-05-05 Duty free\n  Expenses:Gifts ¥100\n  Expenses:Drinks $12.5\n  Liabilities:Card\n",
    )?;
    let entries = &ledger.transactions()[0].entries;
    assert_eq!(entries.len(), 4);
    assert_eq!(
        entries[2],
        Entry::new("Liabilities:Card", Some(Amount::new(dec!(-100), "¥")), 4)
    );
    assert_eq!(
        entries[3],
        Entry::new("Liabilities:Card", Some(Amount::new(dec!(-12.5), "$")), 4)
    );
    Ok(())
}

#[test]
fn unbalanced() {
    let err = libgoodbook::parse("2020-01-01 oops\n  A ¥10.00\n  B ¥5.00\n").unwrap_err();
    assert_eq!(
        err,
        ParseError::Unbalanced {
            line: 3,
            currency: "¥".to_string(),
            residual: dec!(15.00),
        }
    );
    assert_eq!(
        err.to_string(),
        "line 3: transaction does not balance, residual ¥15.00"
    );
}

#[test]
fn second_omission() {
    assert_eq!(
        libgoodbook::parse("2020-01-01 oops\n  A ¥10.00\n  B\n  C\n").unwrap_err(),
        ParseError::MultipleOmittedAmounts { line: 4 }
    );
}

#[test]
fn amount_without_currency() {
    assert_eq!(
        libgoodbook::parse("2020-01-01 oops\n  A 10.00\n  B\n").unwrap_err(),
        ParseError::InvalidEntry { line: 2 }
    );
}

#[test]
fn hierarchy_rolls_up() -> Result<()> {
    let ledger = libgoodbook::parse(
        "2020-01-01 a\n  Expenses:Food ¥10\n  Assets:Cash\n2020-01-02 b\n  Expenses:Transport ¥5\n  Assets:Cash\n",
    )?;
    let tree = ledger.hierarchy();
    let expenses = tree.find("Expenses").ok_or(anyhow!("no Expenses"))?;
    assert_eq!(expenses.balance.get("¥"), Some(&dec!(15)));
    assert_eq!(expenses.children["Food"].balance.get("¥"), Some(&dec!(10)));
    assert_eq!(expenses.children["Transport"].balance.get("¥"), Some(&dec!(5)));

    let rows: Vec<(usize, &str)> = tree
        .rows(&CurrencyWeights::default())
        .into_iter()
        .map(|row| (row.depth, row.name))
        .collect();
    assert_eq!(
        rows,
        vec![
            (0, "Assets"),
            (1, "Cash"),
            (0, "Expenses"),
            (1, "Food"),
            (1, "Transport"),
        ]
    );
    Ok(())
}

#[test]
fn stat_filter() -> Result<()> {
    let ledger = libgoodbook::parse(
        "2020-01-01 rent\n  Expenses:Home:Rent ¥3000\n  Assets:Bank\n2020-01-02 tea\n  Expenses:Food ¥5\n  Assets:Cash\n",
    )?;
    let hits = ledger.filter(&LargeExpense::new("Home", "¥", dec!(1000)));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].line, 1);
    Ok(())
}

#[test]
fn overflowing_amounts_are_errors() {
    assert_eq!(
        libgoodbook::parse(
            "2020-01-01 huge\n  A ¥79228162514264337593543950335\n  B ¥79228162514264337593543950335\n  C\n"
        )
        .unwrap_err(),
        ParseError::AmountOverflow { line: 3 }
    );
    assert_eq!(
        libgoodbook::parse(
            "2020-01-01 one\n  Assets:Vault ¥79228162514264337593543950335\n  Equity:Opening\n2020-01-02 two\n  Assets:Vault ¥79228162514264337593543950335\n  Equity:Opening\n"
        )
        .unwrap_err(),
        ParseError::AmountOverflow { line: 5 }
    );
}

#[test]
fn too_precise_amount_is_invalid() {
    let input = "2020-01-01 dust\n  A ¥0.123456789012345678901234567891\n  B ¥-0.123456789012345678901234567891\n";
    assert_eq!(
        libgoodbook::parse(input).unwrap_err(),
        ParseError::InvalidEntry { line: 2 }
    );
}
