//! Money type for representing commodity amounts
//!
//! Amounts are stored as an i64 scaled by the commodity's precision (cents for
//! USD, whole yen for JPY) to avoid floating-point issues. Arithmetic is only
//! defined between amounts of the same commodity; everything else is an error.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use thiserror::Error;

use super::commodity::Commodity;

/// Longest fractional part accepted by [`Money::parse`]
const MAX_PARSE_FRACTION: usize = 30;

/// Errors from money arithmetic and parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Commodity mismatch: expected {expected}, found {found}")]
    CommodityMismatch { expected: String, found: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Amount out of range")]
    Overflow,

    #[error("Invalid money format: {0}")]
    InvalidFormat(String),
}

/// A signed amount in a specific commodity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the commodity's smallest unit
    amount: i64,
    commodity: Commodity,
}

impl Money {
    /// Create a Money amount from the commodity's smallest unit
    ///
    /// # Examples
    /// ```
    /// use tally::models::{Commodity, Money};
    /// let amount = Money::from_minor(1050, Commodity::usd()); // $10.50
    /// assert_eq!(amount.to_string(), "$10.50");
    /// ```
    pub fn from_minor(amount: i64, commodity: Commodity) -> Self {
        Self { amount, commodity }
    }

    /// Create a zero amount in the given commodity
    pub fn zero(commodity: Commodity) -> Self {
        Self::from_minor(0, commodity)
    }

    /// Amount in the smallest unit (e.g. cents)
    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn commodity(&self) -> &Commodity {
        &self.commodity
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    /// Absolute value
    pub fn abs(&self) -> Self {
        Self::from_minor(self.amount.saturating_abs(), self.commodity.clone())
    }

    /// Negated value
    pub fn negate(&self) -> Self {
        Self::from_minor(self.amount.saturating_neg(), self.commodity.clone())
    }

    fn ensure_same_commodity(&self, other: &Money) -> Result<(), MoneyError> {
        if self.commodity != other.commodity {
            return Err(MoneyError::CommodityMismatch {
                expected: self.commodity.code.clone(),
                found: other.commodity.code.clone(),
            });
        }
        Ok(())
    }

    /// Add two amounts of the same commodity
    pub fn try_add(&self, other: &Money) -> Result<Self, MoneyError> {
        self.ensure_same_commodity(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(amount, self.commodity.clone()))
    }

    /// Subtract `other` from this amount
    pub fn try_sub(&self, other: &Money) -> Result<Self, MoneyError> {
        self.ensure_same_commodity(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(amount, self.commodity.clone()))
    }

    /// Compare two amounts of the same commodity
    pub fn try_cmp(&self, other: &Money) -> Result<Ordering, MoneyError> {
        self.ensure_same_commodity(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Ratio of this amount to `divisor`, rounded half-to-even at the
    /// commodity's precision
    pub fn divide(&self, divisor: &Money) -> Result<Ratio, MoneyError> {
        self.ensure_same_commodity(divisor)?;
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }

        let numerator = i128::from(self.amount) * i128::from(self.commodity.scale());
        let scaled = div_round_half_even(numerator, i128::from(divisor.amount));
        let scaled = i64::try_from(scaled).map_err(|_| MoneyError::Overflow)?;
        Ok(Ratio::new(scaled, self.commodity.fraction_digits))
    }

    /// Sum amounts, all of which must be in `commodity`
    pub fn sum<'a, I>(commodity: &Commodity, amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(commodity.clone()), |acc, m| acc.try_add(m))
    }

    /// Parse a decimal amount in the given commodity
    ///
    /// Accepts "10.50", "-10.50", "$10.50", "10.50 USD" and "10". Digits beyond
    /// the commodity's precision are rounded half-to-even.
    pub fn parse(s: &str, commodity: &Commodity) -> Result<Self, MoneyError> {
        let raw = s.trim();
        let invalid = || MoneyError::InvalidFormat(raw.to_string());

        let (negative, rest) = match raw.strip_prefix('-') {
            Some(stripped) => (true, stripped.trim_start()),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        let rest = rest.strip_prefix(commodity.symbol.as_str()).unwrap_or(rest);
        let rest = rest
            .strip_suffix(commodity.code.as_str())
            .unwrap_or(rest)
            .trim();

        let (whole, frac) = rest.split_once('.').unwrap_or((rest, ""));
        if (whole.is_empty() && frac.is_empty())
            || frac.len() > MAX_PARSE_FRACTION
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let digits = usize::from(commodity.fraction_digits);
        let frac_scaled: i128 = if frac.len() <= digits {
            let padded = format!("{:0<width$}", frac, width = digits);
            if padded.is_empty() {
                0
            } else {
                padded.parse().map_err(|_| invalid())?
            }
        } else {
            let value: i128 = frac.parse().map_err(|_| invalid())?;
            let excess = u32::try_from(frac.len() - digits).map_err(|_| invalid())?;
            div_round_half_even(value, 10_i128.pow(excess))
        };

        let total = whole
            .checked_mul(i128::from(commodity.scale()))
            .and_then(|w| w.checked_add(frac_scaled))
            .ok_or(MoneyError::Overflow)?;
        let total = if negative { -total } else { total };
        let amount = i64::try_from(total).map_err(|_| MoneyError::Overflow)?;

        Ok(Self::from_minor(amount, commodity.clone()))
    }

    /// Amount without symbol, e.g. "-50.00"
    pub fn to_plain_string(&self) -> String {
        let magnitude = format_scaled(self.amount.unsigned_abs(), self.commodity.fraction_digits);
        if self.is_negative() {
            format!("-{}", magnitude)
        } else {
            magnitude
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = format_scaled(self.amount.unsigned_abs(), self.commodity.fraction_digits);
        if self.is_negative() {
            write!(f, "-{}{}", self.commodity.symbol, magnitude)
        } else {
            write!(f, "{}{}", self.commodity.symbol, magnitude)
        }
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

/// Exact decimal quotient of two amounts
///
/// Stored as `scaled / 10^digits`. Equality and ordering compare values, so
/// `0.25` equals `0.250`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ratio {
    scaled: i64,
    digits: u8,
}

impl Ratio {
    pub const fn new(scaled: i64, digits: u8) -> Self {
        Self { scaled, digits }
    }

    /// The value reported when the denominator of a progress ratio is zero
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.scaled == 0
    }

    fn denominator(&self) -> i128 {
        10_i128.pow(u32::from(self.digits))
    }

    /// Lossy conversion for presentation
    pub fn to_f64(&self) -> f64 {
        self.scaled as f64 / 10_f64.powi(i32::from(self.digits))
    }

    /// Whole percent, truncated toward zero
    pub fn percent(&self) -> i64 {
        let pct = i128::from(self.scaled) * 100 / self.denominator();
        pct as i64
    }

    /// The ratio clamped to `[0, 1]` for progress display
    pub fn clamped(&self) -> Self {
        if self.scaled < 0 {
            Self::new(0, self.digits)
        } else if i128::from(self.scaled) > self.denominator() {
            Self::new(10_i64.pow(u32::from(self.digits)), self.digits)
        } else {
            *self
        }
    }
}

impl PartialEq for Ratio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ratio {}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = i128::from(self.scaled) * other.denominator();
        let right = i128::from(other.scaled) * self.denominator();
        left.cmp(&right)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = format_scaled(self.scaled.unsigned_abs(), self.digits);
        if self.scaled < 0 {
            write!(f, "-{}", magnitude)
        } else {
            write!(f, "{}", magnitude)
        }
    }
}

fn format_scaled(magnitude: u64, digits: u8) -> String {
    if digits == 0 {
        return magnitude.to_string();
    }
    let scale = 10_u64.pow(u32::from(digits));
    format!(
        "{}.{:0width$}",
        magnitude / scale,
        magnitude % scale,
        width = usize::from(digits)
    )
}

/// Integer division rounding half-to-even (banker's rounding)
pub(crate) fn div_round_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder == 0 {
        return quotient;
    }

    let negative = (numerator < 0) != (denominator < 0);
    let round_away = match (remainder.abs() * 2).cmp(&denominator.abs()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => quotient % 2 != 0,
    };

    match (round_away, negative) {
        (false, _) => quotient,
        (true, false) => quotient + 1,
        (true, true) => quotient - 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(cents: i64) -> Money {
        Money::from_minor(cents, Commodity::usd())
    }

    fn eur(cents: i64) -> Money {
        Money::from_minor(cents, Commodity::eur())
    }

    #[test]
    fn test_display() {
        assert_eq!(usd(1050).to_string(), "$10.50");
        assert_eq!(usd(0).to_string(), "$0.00");
        assert_eq!(usd(-1050).to_string(), "-$10.50");
        assert_eq!(usd(5).to_string(), "$0.05");
        assert_eq!(Money::from_minor(500, Commodity::jpy()).to_string(), "¥500");
        assert_eq!(usd(-5000).to_plain_string(), "-50.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = usd(1000);
        let b = usd(500);

        assert_eq!(a.try_add(&b).unwrap(), usd(1500));
        assert_eq!(a.try_sub(&b).unwrap(), usd(500));
        assert_eq!(-a.clone(), usd(-1000));
        assert_eq!(usd(-300).abs(), usd(300));
        assert_eq!(a.try_cmp(&b).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_commodity_mismatch() {
        let err = usd(100).try_add(&eur(100)).unwrap_err();
        assert_eq!(
            err,
            MoneyError::CommodityMismatch {
                expected: "USD".into(),
                found: "EUR".into()
            }
        );
        assert!(usd(100).try_sub(&eur(1)).is_err());
        assert!(usd(100).try_cmp(&eur(1)).is_err());
        assert!(usd(100).divide(&eur(1)).is_err());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let max = usd(i64::MAX);
        assert_eq!(max.try_add(&usd(1)).unwrap_err(), MoneyError::Overflow);
    }

    #[test]
    fn test_divide() {
        assert_eq!(usd(5000).divide(&usd(20000)).unwrap(), Ratio::new(25, 2));
        assert_eq!(usd(30000).divide(&usd(20000)).unwrap(), Ratio::new(150, 2));
        assert_eq!(
            usd(100).divide(&usd(0)).unwrap_err(),
            MoneyError::DivisionByZero
        );
    }

    #[test]
    fn test_divide_rounds_half_even() {
        // 1/8 = 0.125 -> 0.12, 3/8 = 0.375 -> 0.38
        assert_eq!(usd(100).divide(&usd(800)).unwrap(), Ratio::new(12, 2));
        assert_eq!(usd(300).divide(&usd(800)).unwrap(), Ratio::new(38, 2));
        assert_eq!(usd(-100).divide(&usd(800)).unwrap(), Ratio::new(-12, 2));
    }

    #[test]
    fn test_half_even_helper() {
        assert_eq!(div_round_half_even(5, 2), 2);
        assert_eq!(div_round_half_even(7, 2), 4);
        assert_eq!(div_round_half_even(-5, 2), -2);
        assert_eq!(div_round_half_even(-7, 2), -4);
        assert_eq!(div_round_half_even(10, 3), 3);
        assert_eq!(div_round_half_even(11, 3), 4);
    }

    #[test]
    fn test_parse() {
        let c = Commodity::usd();
        assert_eq!(Money::parse("10.50", &c).unwrap(), usd(1050));
        assert_eq!(Money::parse("$10.50", &c).unwrap(), usd(1050));
        assert_eq!(Money::parse("-10.50", &c).unwrap(), usd(-1050));
        assert_eq!(Money::parse("-$10.50", &c).unwrap(), usd(-1050));
        assert_eq!(Money::parse("10", &c).unwrap(), usd(1000));
        assert_eq!(Money::parse("10.5", &c).unwrap(), usd(1050));
        assert_eq!(Money::parse(".05", &c).unwrap(), usd(5));
        assert_eq!(Money::parse("12.00 USD", &c).unwrap(), usd(1200));
        assert!(Money::parse("abc", &c).is_err());
        assert!(Money::parse("1.2.3", &c).is_err());
        assert!(Money::parse("", &c).is_err());
    }

    #[test]
    fn test_parse_rounds_excess_digits() {
        let c = Commodity::usd();
        assert_eq!(Money::parse("0.125", &c).unwrap(), usd(12));
        assert_eq!(Money::parse("0.135", &c).unwrap(), usd(14));
        assert_eq!(Money::parse("0.995", &c).unwrap(), usd(100));
        assert_eq!(
            Money::parse("1.5", &Commodity::jpy()).unwrap().amount(),
            2
        );
    }

    #[test]
    fn test_sum() {
        let amounts = vec![usd(100), usd(200), usd(300)];
        assert_eq!(Money::sum(&Commodity::usd(), &amounts).unwrap(), usd(600));

        let mixed = vec![usd(100), eur(200)];
        assert!(Money::sum(&Commodity::usd(), &mixed).is_err());
    }

    #[test]
    fn test_ratio() {
        assert_eq!(Ratio::new(25, 2), Ratio::new(250, 3));
        assert!(Ratio::new(150, 2) > Ratio::new(1, 0));
        assert_eq!(Ratio::new(25, 2).to_string(), "0.25");
        assert_eq!(Ratio::new(25, 2).percent(), 25);
        assert_eq!(Ratio::new(150, 2).clamped(), Ratio::new(1, 0));
        assert_eq!(Ratio::new(-5, 2).clamped(), Ratio::zero());
        assert!((Ratio::new(25, 2).to_f64() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serialization() {
        let m = usd(1050);
        let json = serde_json::to_string(&m).unwrap();
        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, deserialized);
    }
}
