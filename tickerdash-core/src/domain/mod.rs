//! Domain types: symbols, price rows, per-symbol series.

pub mod price;
pub mod series;
pub mod symbol;

pub use price::PricePoint;
pub use series::{group_by_symbol, SeriesError, SymbolSeries, TickerRow};
pub use symbol::{parse_symbol_list, Symbol, SymbolError, SymbolList, DEFAULT_MAX_SYMBOLS};
