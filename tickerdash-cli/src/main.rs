//! TickerDash CLI: fetch, compare, and returns commands.
//!
//! Commands:
//! - `fetch`: load tickers, add moving averages, export the long table
//! - `compare`: print and export the date-aligned comparison table
//! - `returns`: print first-to-last percentage returns
//!
//! Every command takes the same request flags and an optional TOML config;
//! flags override the file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tickerdash_core::data::{ComparisonTable, HistoryStore, TracingProgress};
use tickerdash_runner::export::{self, ExportFormat};
use tickerdash_runner::{
    open_provider, parse_date, run_dashboard, DashboardConfig, DashboardResult, RunError,
    SourceKind,
};

#[derive(Parser)]
#[command(
    name = "tickerdash",
    about = "TickerDash CLI: multi-ticker price history, moving averages and returns"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load tickers, compute moving averages, export the long-format table.
    Fetch {
        #[command(flatten)]
        request: RequestArgs,

        /// Export format: csv or parquet.
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output file. Defaults to <output-dir>/stocks_<start>_<end>.<ext>.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print and export closes of every ticker side by side.
    Compare {
        #[command(flatten)]
        request: RequestArgs,

        /// Rescale each ticker so its first close is 100.
        #[arg(long, default_value_t = false)]
        normalize: bool,

        /// Export format: csv or parquet.
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output file. Defaults to <output-dir>/compare_<start>_<end>.<ext>.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the simple percentage return of each ticker.
    Returns {
        #[command(flatten)]
        request: RequestArgs,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Tickers, comma and/or space separated (e.g., AAPL MSFT or "AAPL,MSFT").
    symbols: Vec<String>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start date (YYYY-MM-DD). Defaults to a year before the end date.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Moving-average window; repeat for several. Defaults to 20, 50, 200.
    #[arg(long = "ma", value_name = "N", allow_negative_numbers = true)]
    windows: Vec<i64>,

    /// Data source: yahoo, csv or synthetic.
    #[arg(long)]
    source: Option<String>,

    /// CSV file to load (implies --source csv).
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Maximum number of tickers per request.
    #[arg(long)]
    max_symbols: Option<usize>,

    /// Parallel fetches.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Directory for exported files.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl RequestArgs {
    /// Config file (or defaults) with flags applied on top.
    fn to_config(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::load(path)?,
            None => DashboardConfig::default(),
        };

        if !self.symbols.is_empty() {
            config.symbols = self.symbols.clone();
        }
        if let Some(start) = &self.start {
            config.start = Some(parse_date("start", start)?);
        }
        if let Some(end) = &self.end {
            config.end = Some(parse_date("end", end)?);
        }
        if !self.windows.is_empty() {
            config.windows = self.windows.clone();
        }
        if let Some(csv) = &self.csv {
            config.csv_path = Some(csv.clone());
            config.source = SourceKind::Csv;
        }
        if let Some(source) = &self.source {
            config.source = source.parse()?;
        }
        if let Some(max) = self.max_symbols {
            config.max_symbols = max;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            request,
            format,
            output,
        } => run_fetch(&request, &format, output),
        Commands::Compare {
            request,
            normalize,
            format,
            output,
        } => run_compare(&request, normalize, &format, output),
        Commands::Returns { request, json } => run_returns(&request, json),
    }
}

/// `RUST_LOG` filters (default `info`); `RUST_LOG_FORMAT=json` switches to
/// JSON lines. Logs go to stderr so tables on stdout stay clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Validate, fetch and transform. Prints the failure list either way.
fn load(request: &RequestArgs) -> Result<DashboardResult> {
    let today = chrono::Local::now().date_naive();
    let mut req = request.to_config()?.validate(today)?;

    let provider = open_provider(&mut req)?;
    let store = HistoryStore::new(provider);

    match run_dashboard(&req, &store, &TracingProgress) {
        Ok(result) => {
            if !result.report.failures.is_empty() {
                eprintln!("No data for: {}", result.report.failed_symbols());
            }
            if result.has_synthetic() {
                eprintln!("WARNING: synthetic data; prices are a random walk, not market history");
            }
            tracing::info!(
                dataset_hash = %result.dataset_hash,
                loaded = result.report.succeeded.len(),
                requested = result.report.requested(),
                "dataset loaded"
            );
            Ok(result)
        }
        Err(RunError::NoSymbolsSucceeded { report }) => {
            for failure in &report.failures {
                eprintln!("{}: {}", failure.symbol, failure.reason);
            }
            Err(RunError::NoSymbolsSucceeded { report }.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn run_fetch(request: &RequestArgs, format: &str, output: Option<PathBuf>) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let result = load(request)?;

    print_returns(&result);

    let path = output.unwrap_or_else(|| {
        export::default_export_path(&request.output_dir, result.start, result.end, format)
    });
    export::write_long_table(&result, &path, format)?;
    println!();
    println!("Exported to: {}", path.display());
    Ok(())
}

fn run_compare(
    request: &RequestArgs,
    normalize: bool,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let result = load(request)?;

    let table = if normalize {
        &result.normalized_comparison
    } else {
        &result.comparison
    };
    print_comparison(table);

    let path = output.unwrap_or_else(|| {
        request.output_dir.join(format!(
            "compare_{}_{}.{}",
            result.start,
            result.end,
            format.extension()
        ))
    });
    export::write_comparison(table, &path, format)?;
    println!();
    println!("Exported to: {}", path.display());
    Ok(())
}

fn run_returns(request: &RequestArgs, json: bool) -> Result<()> {
    let result = load(request)?;
    if json {
        let out = serde_json::to_string_pretty(&result.returns)
            .context("failed to serialize returns to JSON")?;
        println!("{out}");
    } else {
        print_returns(&result);
    }
    Ok(())
}

fn fmt_value(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".into())
}

fn print_returns(result: &DashboardResult) {
    println!("Period: {} to {}", result.start, result.end);
    println!();
    println!("{:<10} {:>8} {:>10}", "Ticker", "Rows", "Return %");
    println!("{}", "-".repeat(30));
    for (entry, series) in result.returns.entries.iter().zip(result.series()) {
        println!(
            "{:<10} {:>8} {:>10}",
            entry.symbol,
            series.len(),
            fmt_value(entry.return_pct, 2)
        );
    }
}

fn print_comparison(table: &ComparisonTable) {
    print!("{:<12}", "Date");
    for symbol in &table.symbols {
        print!(" {:>10}", symbol.as_str());
    }
    println!();
    println!("{}", "-".repeat(12 + 11 * table.symbols.len()));
    for row in &table.rows {
        print!("{:<12}", row.date.to_string());
        for value in &row.values {
            print!(" {:>10}", fmt_value(*value, 2));
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_fetch_with_windows() {
        let cli = Cli::try_parse_from([
            "tickerdash", "fetch", "aapl", "msft", "--ma", "5", "--ma", "10", "--start",
            "2024-01-01",
        ])
        .unwrap();
        let Commands::Fetch { request, .. } = cli.command else {
            panic!("expected fetch");
        };
        let config = request.to_config().unwrap();
        assert_eq!(config.symbols, vec!["aapl", "msft"]);
        assert_eq!(config.windows, vec![5, 10]);
        assert_eq!(config.start, chrono::NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn csv_flag_switches_source() {
        let cli = Cli::try_parse_from(["tickerdash", "returns", "--csv", "prices.csv"]).unwrap();
        let Commands::Returns { request, .. } = cli.command else {
            panic!("expected returns");
        };
        let config = request.to_config().unwrap();
        assert_eq!(config.source, SourceKind::Csv);
    }

    #[test]
    fn bad_date_is_rejected() {
        let cli =
            Cli::try_parse_from(["tickerdash", "fetch", "AAPL", "--end", "31/12/2024"]).unwrap();
        let Commands::Fetch { request, .. } = cli.command else {
            panic!("expected fetch");
        };
        assert!(request.to_config().is_err());
    }

    #[test]
    fn negative_window_parses_then_fails_validation() {
        let cli = Cli::try_parse_from(["tickerdash", "fetch", "AAPL", "--ma", "-5"]).unwrap();
        let Commands::Fetch { request, .. } = cli.command else {
            panic!("expected fetch");
        };
        let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert!(request.to_config().unwrap().validate(today).is_err());
    }

    #[test]
    fn missing_values_print_as_dash() {
        assert_eq!(fmt_value(None, 2), "-");
        assert_eq!(fmt_value(Some(1.005), 1), "1.0");
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
