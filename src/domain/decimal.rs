//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Provides strict canonical parsing, a tolerant parser for numbers scraped
//! from rendered page text, and the display formatters used in alert bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// First signed integer or fixed-point number in a piece of text.
static NUMERIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("numeric pattern is a valid regex"));

/// Lossless decimal numeric type for financial calculations.
///
/// Backed by rust_decimal to avoid floating-point drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        // normalize() drops trailing fractional zeros
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Product, or `None` if it does not fit.
    pub fn checked_mul(&self, rhs: Decimal) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

/// Parse a number out of display text such as `"$12,345.50 USD"` or `"-3,000 BTC"`.
///
/// Thousands separators, `$` and the `USD` unit are stripped first; then the first
/// `-?digits[.digits]` run is converted. Returns `None` when the text is absent,
/// holds no number, or the number does not fit a decimal. Never defaults to zero.
pub fn parse_numeric_text(text: Option<&str>) -> Option<Decimal> {
    let text = text?;
    let sanitized = text.replace(',', "").replace('$', "").replace("USD", "");
    let found = NUMERIC_PATTERN.find(sanitized.trim())?;
    Decimal::from_str_canonical(found.as_str()).ok()
}

/// Format a quantity for display: at most 6 decimals, thousands separators, no
/// trailing fractional zeros (`1234.500000` → `1,234.5`, `1000` → `1,000`).
///
/// The sign follows the unrounded value, so `-0.0000001` renders as `-0`.
pub fn format_quantity(value: Decimal) -> String {
    let magnitude = value
        .inner()
        .abs()
        .round_dp_with_strategy(6, RoundingStrategy::MidpointNearestEven)
        .normalize();
    format!("{}{}", sign_of(value), group_thousands(&magnitude.to_string()))
}

/// Format a value as US currency: `$1,234.50`, `$-70,000.00`.
///
/// The sign goes after the `$` and follows the unrounded value (`$-0.00`).
pub fn format_currency(value: Decimal) -> String {
    let mut magnitude = value
        .inner()
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    magnitude.rescale(2);
    format!("${}{}", sign_of(value), group_thousands(&magnitude.to_string()))
}

fn sign_of(value: Decimal) -> &'static str {
    if value.is_negative() {
        "-"
    } else {
        ""
    }
}

/// Insert `,` every three integer digits of an unsigned plain decimal string.
fn group_thousands(plain: &str) -> String {
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (plain, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}.{}", grouped, frac),
        None => grouped,
    }
}
