//! CSV import: the "upload a file" data source.
//!
//! Accepts the long format this toolkit exports (`Date,Open,High,Low,Close,
//! Volume,Ticker,...`) as well as single-symbol files without a ticker
//! column. Header names are matched case-insensitively; unknown columns
//! (`Adj Close`, `SMA_20`, ...) are ignored. Rows without a usable date or
//! close are skipped and counted.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{group_by_symbol, PricePoint, Symbol, SymbolSeries, TickerRow};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct Columns {
    date: Option<usize>,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    volume: Option<usize>,
    ticker: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut cols = Columns::default();
        for (i, name) in headers.iter().enumerate() {
            let slot = match name.trim().to_ascii_lowercase().as_str() {
                "date" | "datetime" | "timestamp" => &mut cols.date,
                "open" => &mut cols.open,
                "high" => &mut cols.high,
                "low" => &mut cols.low,
                "close" => &mut cols.close,
                "volume" => &mut cols.volume,
                "ticker" | "symbol" => &mut cols.ticker,
                _ => continue,
            };
            // first matching column wins
            slot.get_or_insert(i);
        }
        cols
    }
}

/// Parsed contents of a CSV file.
#[derive(Debug, Clone)]
pub struct CsvImport {
    /// One series per ticker, in order of first appearance.
    pub series: Vec<SymbolSeries>,
    /// Rows dropped for a missing/invalid date, close or ticker.
    pub skipped_rows: usize,
}

/// Read a CSV from any reader.
///
/// `default_symbol` labels rows of files without a ticker column; such files
/// are an error without one.
pub fn read_csv<R: Read>(reader: R, default_symbol: Option<&Symbol>) -> Result<CsvImport, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DataError::Csv(format!("read header: {e}")))?
        .clone();
    let cols = Columns::from_headers(&headers);

    let date_col = cols
        .date
        .ok_or_else(|| DataError::Csv("missing Date column".into()))?;
    let close_col = cols
        .close
        .ok_or_else(|| DataError::Csv("missing Close column".into()))?;
    if cols.ticker.is_none() && default_symbol.is_none() {
        return Err(DataError::Csv(
            "no Ticker column and no symbol given for the file".into(),
        ));
    }

    let mut rows = Vec::new();
    let mut skipped_rows = 0usize;

    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| DataError::Csv(format!("row {}: {e}", line + 2)))?;

        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty());

        let symbol = match field(cols.ticker) {
            Some(raw) => Symbol::parse(raw).ok(),
            None => default_symbol.cloned(),
        };
        let date = field(Some(date_col)).and_then(parse_date);
        let close = field(Some(close_col)).and_then(parse_f64);

        let (Some(symbol), Some(date), Some(close)) = (symbol, date, close) else {
            skipped_rows += 1;
            continue;
        };

        rows.push(TickerRow {
            symbol,
            point: PricePoint {
                date,
                open: field(cols.open).and_then(parse_f64),
                high: field(cols.high).and_then(parse_f64),
                low: field(cols.low).and_then(parse_f64),
                close,
                volume: field(cols.volume).and_then(parse_volume),
            },
        });
    }

    if skipped_rows > 0 {
        tracing::warn!(skipped_rows, "skipped CSV rows without a usable date, close or ticker");
    }

    Ok(CsvImport {
        series: group_by_symbol(rows),
        skipped_rows,
    })
}

/// Read a CSV file. Files without a ticker column take `default_symbol`, or
/// the file stem when that is a valid symbol.
pub fn load_csv(path: &Path, default_symbol: Option<&Symbol>) -> Result<CsvImport, DataError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DataError::Csv(format!("open {}: {e}", path.display())))?;

    let stem_symbol = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| Symbol::parse(s).ok());

    read_csv(file, default_symbol.or(stem_symbol.as_ref()))
}

/// Accepts `YYYY-MM-DD` with an optional time/zone suffix
/// (`2024-01-02 00:00:00-05:00`, `2024-01-02T00:00:00`).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_f64(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_volume(raw: &str) -> Option<u64> {
    raw.parse::<u64>()
        .ok()
        .or_else(|| parse_f64(raw).filter(|v| *v >= 0.0).map(|v| v.round() as u64))
}

/// Serves symbols out of an imported CSV file.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    series: HashMap<Symbol, SymbolSeries>,
    order: Vec<Symbol>,
}

impl CsvProvider {
    pub fn from_import(import: CsvImport) -> Self {
        let order = import.series.iter().map(|s| s.symbol().clone()).collect();
        let series = import
            .series
            .into_iter()
            .map(|s| (s.symbol().clone(), s))
            .collect();
        Self { series, order }
    }

    pub fn from_path(path: &Path, default_symbol: Option<&Symbol>) -> Result<Self, DataError> {
        Ok(Self::from_import(load_csv(path, default_symbol)?))
    }

    /// Symbols present in the file, in order of first appearance.
    pub fn symbols(&self) -> &[Symbol] {
        &self.order
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let series = self
            .series
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.clone(),
            })?
            .slice_dates(start, end);

        if series.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.clone(),
                start,
                end,
            });
        }

        Ok(FetchResult {
            series,
            source: DataSource::CsvImport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    const LONG: &str = "\
Date,Open,High,Low,Close,Volume,Ticker,SMA_2
2024-01-02,99,101,98,100,1000,AAPL,
2024-01-03,100,106,99,105,1100,AAPL,102.5
2024-01-02,51,52,49,50,2000,msft,
2024-01-03,50,51,44,45,2100,MSFT,47.5
";

    #[test]
    fn reads_long_format_grouped_by_ticker() {
        let import = read_csv(LONG.as_bytes(), None).unwrap();
        assert_eq!(import.skipped_rows, 0);
        assert_eq!(import.series.len(), 2);
        assert_eq!(import.series[0].symbol(), &sym("AAPL"));
        assert_eq!(import.series[1].symbol(), &sym("MSFT"));
        assert_eq!(import.series[1].closes(), vec![Some(50.0), Some(45.0)]);
        let first = &import.series[0].points()[0];
        assert_eq!(first.open, Some(99.0));
        assert_eq!(first.volume, Some(1000));
    }

    #[test]
    fn single_symbol_file_uses_default_symbol() {
        let csv = "date,close\n2024-01-03,11\n2024-01-02 00:00:00-05:00,10\n";
        let import = read_csv(csv.as_bytes(), Some(&sym("SPY"))).unwrap();
        assert_eq!(import.series.len(), 1);
        let series = &import.series[0];
        assert_eq!(series.symbol(), &sym("SPY"));
        // sorted on import
        assert_eq!(series.first_date(), Some(d(2)));
        assert_eq!(series.points()[0].open, None);
    }

    #[test]
    fn file_without_ticker_needs_a_symbol() {
        let csv = "Date,Close\n2024-01-02,10\n";
        assert!(matches!(read_csv(csv.as_bytes(), None), Err(DataError::Csv(_))));
    }

    #[test]
    fn missing_close_column_is_an_error() {
        let csv = "Date,Open\n2024-01-02,10\n";
        assert!(read_csv(csv.as_bytes(), Some(&sym("X"))).is_err());
    }

    #[test]
    fn bad_rows_are_skipped_and_counted() {
        let csv = "Date,Close,Ticker\nnot-a-date,1,AAA\n2024-01-02,,AAA\n2024-01-03,3,\n2024-01-04,4,AAA\n";
        let import = read_csv(csv.as_bytes(), None).unwrap();
        assert_eq!(import.skipped_rows, 3);
        assert_eq!(import.series[0].len(), 1);
    }

    #[test]
    fn float_volume_is_accepted() {
        assert_eq!(parse_volume("8.2e7"), Some(82_000_000));
        assert_eq!(parse_volume("-1"), None);
    }

    #[test]
    fn provider_filters_symbol_and_range() {
        let provider = CsvProvider::from_import(read_csv(LONG.as_bytes(), None).unwrap());
        assert_eq!(provider.symbols(), &[sym("AAPL"), sym("MSFT")]);

        let got = provider.fetch(&sym("AAPL"), d(3), d(31)).unwrap();
        assert_eq!(got.series.len(), 1);
        assert_eq!(got.source, DataSource::CsvImport);

        assert!(matches!(
            provider.fetch(&sym("ZZZZ"), d(1), d(31)),
            Err(DataError::SymbolNotFound { .. })
        ));
        assert!(matches!(
            provider.fetch(&sym("AAPL"), d(10), d(31)),
            Err(DataError::NoData { .. })
        ));
    }

    #[test]
    fn load_csv_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qqq.csv");
        std::fs::write(&path, "Date,Close\n2024-01-02,400\n").unwrap();
        let import = load_csv(&path, None).unwrap();
        assert_eq!(import.series[0].symbol(), &sym("QQQ"));
    }
}
