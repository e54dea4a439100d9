//! TickerDash Runner: request configuration, batch orchestration, export.
//!
//! This crate builds on `tickerdash-core` to provide:
//! - TOML/flag configuration with validation before any fetch
//! - Parallel per-symbol fetching with a per-symbol failure report
//! - The full transform pass (moving averages, normalization, alignment,
//!   returns) over whatever succeeded
//! - CSV and Parquet export

pub mod config;
pub mod export;
pub mod result;
pub mod runner;

pub use config::{parse_date, DashboardConfig, DashboardRequest, SourceKind};
pub use export::ExportFormat;
pub use result::{DashboardResult, FailureReason, FetchReport, SymbolFailure};
pub use runner::{compute_dataset_hash, fetch_all, open_provider, run_dashboard, RunError};
