//! Ticker symbols and free-text ticker list parsing.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted ticker, in characters.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Default cap on the number of tickers taken from one input list.
pub const DEFAULT_MAX_SYMBOLS: usize = 8;

/// Uppercase ticker symbol, 1–10 characters.
///
/// Input is matched case-insensitively and stored uppercase. Besides ASCII
/// letters and digits, `.`, `-`, `^` and `=` are accepted so index and
/// currency tickers (`^GSPC`, `BRK-B`, `EURUSD=X`) parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SymbolError::Empty);
        }
        if trimmed.chars().count() > MAX_SYMBOL_LEN {
            return Err(SymbolError::TooLong(trimmed.to_string()));
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
        {
            return Err(SymbolError::InvalidChar {
                symbol: trimmed.to_string(),
                found: c,
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("empty symbol")]
    Empty,

    #[error("symbol '{0}' is longer than {MAX_SYMBOL_LEN} characters")]
    TooLong(String),

    #[error("symbol '{symbol}' contains invalid character '{found}'")]
    InvalidChar { symbol: String, found: char },
}

/// Result of cleaning a free-text ticker list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolList {
    /// Valid symbols in input order. Not deduplicated.
    pub symbols: Vec<Symbol>,
    /// Tokens that survived cleaning but are not valid symbols.
    pub rejected: Vec<(String, SymbolError)>,
}

/// Turn a comma- and/or space-separated ticker string into symbols.
///
/// Tokens are trimmed and uppercased, empty tokens dropped, and the list is
/// cut to `max_symbols` before validation. An input with no tokens at all is
/// a configuration error.
pub fn parse_symbol_list(raw: &str, max_symbols: usize) -> Result<SymbolList, ConfigError> {
    let tokens: Vec<String> = raw
        .replace(char::is_whitespace, ",")
        .split(',')
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .take(max_symbols)
        .collect();

    if tokens.is_empty() {
        return Err(ConfigError::EmptySymbolList);
    }

    let mut list = SymbolList::default();
    for token in tokens {
        match Symbol::parse(&token) {
            Ok(sym) => list.symbols.push(sym),
            Err(e) => list.rejected.push((token, e)),
        }
    }
    Ok(list)
}
