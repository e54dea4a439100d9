//! Data sources and multi-symbol alignment.

pub mod align;
pub mod cache;
pub mod csv_import;
pub mod provider;
pub mod store;
pub mod synthetic;
pub mod yahoo;

pub use align::{align, align_normalized, ComparisonRow, ComparisonTable};
pub use cache::{CachedProvider, DEFAULT_TTL};
pub use csv_import::{load_csv, read_csv, CsvImport, CsvProvider};
pub use provider::{
    DataError, DataProvider, DataSource, FetchProgress, FetchResult, NoProgress, TracingProgress,
};
pub use store::HistoryStore;
pub use synthetic::SyntheticProvider;
pub use yahoo::{YahooProvider, DEFAULT_TIMEOUT};
