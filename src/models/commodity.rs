//! Commodity (currency or unit) definitions
//!
//! A commodity fixes the number of fractional digits every [`Money`](super::Money)
//! amount in it is scaled by.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest supported precision; keeps `10^digits` well inside i64
pub const MAX_FRACTION_DIGITS: u8 = 9;

/// A currency or other unit with a fixed fractional precision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commodity {
    /// Identifier, e.g. "USD"
    pub code: String,

    /// Display symbol, e.g. "$"
    pub symbol: String,

    /// Number of digits after the decimal point
    pub fraction_digits: u8,
}

impl Commodity {
    /// Create a commodity, clamping the precision to [`MAX_FRACTION_DIGITS`]
    pub fn new(code: impl Into<String>, symbol: impl Into<String>, fraction_digits: u8) -> Self {
        Self {
            code: code.into().to_uppercase(),
            symbol: symbol.into(),
            fraction_digits: fraction_digits.min(MAX_FRACTION_DIGITS),
        }
    }

    pub fn usd() -> Self {
        Self::new("USD", "$", 2)
    }

    pub fn eur() -> Self {
        Self::new("EUR", "€", 2)
    }

    pub fn gbp() -> Self {
        Self::new("GBP", "£", 2)
    }

    pub fn jpy() -> Self {
        Self::new("JPY", "¥", 0)
    }

    /// Look up a known ISO 4217 commodity by code (case-insensitive)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Self::usd()),
            "EUR" => Some(Self::eur()),
            "GBP" => Some(Self::gbp()),
            "JPY" => Some(Self::jpy()),
            "CHF" => Some(Self::new("CHF", "CHF", 2)),
            "CAD" => Some(Self::new("CAD", "CA$", 2)),
            "AUD" => Some(Self::new("AUD", "A$", 2)),
            _ => None,
        }
    }

    /// `10^fraction_digits`, the scale factor between units and stored amounts
    pub fn scale(&self) -> i64 {
        10_i64.pow(u32::from(self.fraction_digits))
    }
}

impl Default for Commodity {
    fn default() -> Self {
        Self::usd()
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}
