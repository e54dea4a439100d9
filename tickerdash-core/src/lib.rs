//! TickerDash Core: price-history domain types, data sources and the pure
//! transforms behind the dashboard.
//!
//! This crate contains:
//! - Domain types (symbols, price points, per-symbol series)
//! - Data providers (Yahoo Finance, CSV import, synthetic walks) behind one trait
//! - A read-through TTL cache and the never-failing history store
//! - Simple moving averages per symbol
//! - Normalization to 100 and multi-symbol date alignment
//! - First-to-last simple returns
//!
//! Everything here is synchronous and free of global state; batching,
//! configuration and export live in `tickerdash-runner`.

pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod normalize;
pub mod returns;

pub use error::ConfigError;
