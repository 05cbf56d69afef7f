use anyhow::{anyhow, Context, Result};
use clap::Parser;
use libgoodbook::account::CurrencyWeights;
use libgoodbook::filter::LargeExpense;
use libgoodbook::ledger::Ledger;
use rust_decimal::Decimal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

mod report;

use report::ReportConfig;

#[derive(Parser)]
#[command(version, about = "Balance reports for plain text double-entry ledgers", long_about = None)]
struct Cli {
    /// Ledger file path
    ledger: PathBuf,

    /// Report to run, matched by prefix: b[alance] (default), m[onthly], p[rint], stat
    command: Option<String>,

    /// List balances per account instead of as a tree
    #[arg(long)]
    flat: bool,

    /// Spaces per tree level
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Currency weight for ordering accounts, e.g. `$=7`, may be repeated
    #[arg(short, long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, Decimal)>,

    /// Report every problem in the ledger instead of stopping at the first
    #[arg(long)]
    check: bool,

    /// `stat`: account segment to look for
    #[arg(long, default_value = "Expenses")]
    keyword: String,

    /// `stat`: currency to look for
    #[arg(long, default_value = "¥")]
    currency: String,

    /// `stat`: amounts strictly above this match
    #[arg(long, default_value = "1000")]
    threshold: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Report {
    Balance,
    Monthly,
    Print,
    Stat,
}

impl Report {
    fn from_prefix(command: Option<&str>) -> Result<Report> {
        match command {
            None => Ok(Report::Balance),
            Some(cmd) if cmd.starts_with("stat") => Ok(Report::Stat),
            Some(cmd) if cmd.starts_with('b') => Ok(Report::Balance),
            Some(cmd) if cmd.starts_with('m') => Ok(Report::Monthly),
            Some(cmd) if cmd.starts_with('p') => Ok(Report::Print),
            Some(cmd) => Err(anyhow!("unknown command `{}'", cmd)),
        }
    }
}

fn parse_weight(s: &str) -> Result<(String, Decimal), String> {
    let (currency, weight) = s
        .split_once('=')
        .ok_or(format!("expected SYMBOL=WEIGHT, got `{}'", s))?;
    let weight = weight
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("invalid weight `{}': {}", weight, e))?;
    Ok((currency.trim().to_string(), weight))
}

impl Cli {
    fn report_config(&self) -> ReportConfig {
        let mut weights = CurrencyWeights::default();
        for (currency, weight) in &self.weights {
            weights.set(currency, *weight);
        }
        ReportConfig {
            weights,
            indent: self.indent,
            flat: self.flat,
        }
    }
}

fn run<W: Write, E: Write>(cli: &Cli, out: &mut W, err: &mut E) -> Result<bool> {
    let input = fs::read_to_string(&cli.ledger)
        .with_context(|| format!("reading {}", cli.ledger.display()))?;
    render(cli, &input, out, err)
}

/// Run the selected report over `input`. Reports go to `out`, `--check`
/// diagnostics to `err`. `Ok(false)` means the check found problems.
fn render<W: Write, E: Write>(cli: &Cli, input: &str, out: &mut W, err: &mut E) -> Result<bool> {
    let report = Report::from_prefix(cli.command.as_deref())?;

    if cli.check {
        let errors = Ledger::check(input);
        for error in &errors {
            writeln!(err, "{}", error)?;
        }
        return Ok(errors.is_empty());
    }

    let ledger = Ledger::parse(input)?;
    let config = cli.report_config();
    debug!(?report, "running report");

    match report {
        Report::Balance => report::write_balances(out, ledger.balances(), &config)?,
        Report::Monthly => report::write_monthly(out, &ledger.monthly_balances()?, &config)?,
        Report::Print => report::write_ledger(out, &ledger)?,
        Report::Stat => {
            let filter = LargeExpense::new(&cli.keyword, &cli.currency, cli.threshold);
            report::write_transactions(out, ledger.filter(&filter))?
        }
    }

    out.flush()?;
    Ok(true)
}

/// Turn the outcome of a run into success or failure, printing a failure
/// as a single line on `err`.
fn exit_status<E: Write>(result: Result<bool>, err: &mut E) -> bool {
    match result {
        Ok(ok) => ok,
        Err(error) => {
            // Nothing left to report to if stderr is gone.
            let _ = writeln!(err, "{:#}", error);
            false
        }
    }
}

fn main() -> ExitCode {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("{}", err);
    }

    let cli = Cli::parse();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let result = run(&cli, &mut out, &mut err);
    if exit_status(result, &mut err) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
