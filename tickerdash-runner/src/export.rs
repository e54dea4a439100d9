//! Export: CSV and Parquet tables for a dashboard result.
//!
//! Three tables:
//! - **Long**: `Date,Open,High,Low,Close,Volume,Ticker,SMA_<w>...`, one row
//!   per symbol and date, symbols in request order
//! - **Comparison**: `Date,<SYM1>,<SYM2>,...`, raw or normalized closes
//! - **Returns**: `Ticker,Return %`
//!
//! Undefined values are empty CSV cells and nulls in Parquet. The long CSV
//! reads back through the CSV import source.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::{Column, DataFrame, DataType, ParquetWriter};

use tickerdash_core::data::ComparisonTable;
use tickerdash_core::returns::ReturnSummary;

use crate::result::DashboardResult;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            other => bail!("unknown export format '{other}' (expected csv or parquet)"),
        }
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Long-format table: every loaded row with its MA columns.
pub fn long_table_csv(result: &DashboardResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = ["Date", "Open", "High", "Low", "Close", "Volume", "Ticker"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(result.windows.iter().map(|w| w.column_name()));
    wtr.write_record(&header)?;

    for indicated in &result.indicated {
        let symbol = indicated.series.symbol().as_str();
        for (i, p) in indicated.series.points().iter().enumerate() {
            let mut record = vec![
                p.date.to_string(),
                cell(p.open),
                cell(p.high),
                cell(p.low),
                p.close.to_string(),
                p.volume.map(|v| v.to_string()).unwrap_or_default(),
                symbol.to_string(),
            ];
            record.extend(
                result
                    .windows
                    .iter()
                    .map(|&w| cell(indicated.ma(w).and_then(|col| col[i]))),
            );
            wtr.write_record(&record)?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Wide comparison table: one column per symbol.
pub fn comparison_csv(table: &ComparisonTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["Date".to_string()];
    header.extend(table.symbols.iter().map(|s| s.to_string()));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.date.to_string()];
        record.extend(row.values.iter().map(|&v| cell(v)));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn returns_csv(returns: &ReturnSummary) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Ticker", "Return %"])?;
    for entry in &returns.entries {
        wtr.write_record([entry.symbol.to_string(), cell(entry.return_pct)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Parquet export ─────────────────────────────────────────────────

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Polars stores `Date` as days since the Unix epoch.
fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn date_column(dates: Vec<i32>) -> Result<Column> {
    Column::new("Date".into(), dates)
        .cast(&DataType::Date)
        .context("failed to cast Date column")
}

pub fn long_table_frame(result: &DashboardResult) -> Result<DataFrame> {
    let rows = || {
        result
            .indicated
            .iter()
            .flat_map(|ind| ind.series.points().iter().map(move |p| (ind, p)))
    };

    let mut columns = vec![
        date_column(rows().map(|(_, p)| epoch_days(p.date)).collect())?,
        Column::new("Open".into(), rows().map(|(_, p)| p.open).collect::<Vec<_>>()),
        Column::new("High".into(), rows().map(|(_, p)| p.high).collect::<Vec<_>>()),
        Column::new("Low".into(), rows().map(|(_, p)| p.low).collect::<Vec<_>>()),
        Column::new("Close".into(), rows().map(|(_, p)| p.close).collect::<Vec<_>>()),
        Column::new("Volume".into(), rows().map(|(_, p)| p.volume).collect::<Vec<_>>()),
        Column::new(
            "Ticker".into(),
            rows()
                .map(|(ind, _)| ind.series.symbol().as_str())
                .collect::<Vec<_>>(),
        ),
    ];

    for &window in &result.windows {
        let values: Vec<Option<f64>> = result
            .indicated
            .iter()
            .flat_map(|ind| match ind.ma(window) {
                Some(col) => col.to_vec(),
                None => vec![None; ind.series.len()],
            })
            .collect();
        columns.push(Column::new(window.column_name().into(), values));
    }

    DataFrame::new(columns).context("failed to build long-format dataframe")
}

pub fn comparison_frame(table: &ComparisonTable) -> Result<DataFrame> {
    let mut columns = vec![date_column(
        table.rows.iter().map(|r| epoch_days(r.date)).collect(),
    )?];
    for (i, symbol) in table.symbols.iter().enumerate() {
        let values: Vec<Option<f64>> = table.rows.iter().map(|r| r.values[i]).collect();
        columns.push(Column::new(symbol.as_str().into(), values));
    }
    DataFrame::new(columns).context("failed to build comparison dataframe")
}

fn write_parquet(path: &Path, mut df: DataFrame) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create parquet file {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("failed to write parquet {}", path.display()))?;
    Ok(())
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

// ─── File writers ───────────────────────────────────────────────────

/// Write the long table to `path` in the given format.
pub fn write_long_table(result: &DashboardResult, path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => write_text(path, &long_table_csv(result)?),
        ExportFormat::Parquet => write_parquet(path, long_table_frame(result)?),
    }
}

pub fn write_comparison(table: &ComparisonTable, path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => write_text(path, &comparison_csv(table)?),
        ExportFormat::Parquet => write_parquet(path, comparison_frame(table)?),
    }
}

pub fn write_returns(returns: &ReturnSummary, path: &Path) -> Result<()> {
    write_text(path, &returns_csv(returns)?)
}

/// Default long-table path: `<dir>/stocks_<start>_<end>.<ext>`.
pub fn default_export_path(
    output_dir: &Path,
    start: NaiveDate,
    end: NaiveDate,
    format: ExportFormat,
) -> PathBuf {
    output_dir.join(format!("stocks_{start}_{end}.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_days_counts_from_1970() {
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), 19_723);
    }

    #[test]
    fn format_parses() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("parquet".parse::<ExportFormat>().unwrap(), ExportFormat::Parquet);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn default_path_uses_date_range() {
        let path = default_export_path(
            Path::new("out"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            ExportFormat::Csv,
        );
        assert_eq!(path, Path::new("out/stocks_2024-01-01_2024-12-31.csv"));
    }

    #[test]
    fn empty_cells_for_undefined() {
        assert_eq!(cell(None), "");
        assert_eq!(cell(Some(102.5)), "102.5");
    }
}
