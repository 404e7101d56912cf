//! Perpetual position rows as scraped from the vault page.

use super::{Coin, Decimal};

/// Number of leading cells a row must expose: coin, leverage, size, mark price.
pub const POSITION_CELLS: usize = 4;

/// One open perpetual position.
///
/// Only constructed from a fully parsed row, so every field is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    coin: Coin,
    leverage: String,
    size: Decimal,
    mark_price: Decimal,
    position_value: Decimal,
}

impl Position {
    /// Returns `None` when size × mark price does not fit a decimal.
    pub fn new(
        coin: Coin,
        leverage: impl Into<String>,
        size: Decimal,
        mark_price: Decimal,
    ) -> Option<Self> {
        let position_value = size.checked_mul(mark_price)?;
        Some(Self {
            coin,
            leverage: leverage.into(),
            size,
            mark_price,
            position_value,
        })
    }

    pub fn coin(&self) -> &Coin {
        &self.coin
    }

    /// Leverage label as displayed (e.g. "5x"); may be empty.
    pub fn leverage(&self) -> &str {
        &self.leverage
    }

    /// Signed size: positive = long, negative = short.
    pub fn size(&self) -> Decimal {
        self.size
    }

    pub fn mark_price(&self) -> Decimal {
        self.mark_price
    }

    /// Size × mark price (signed).
    pub fn position_value(&self) -> Decimal {
        self.position_value
    }

    pub fn absolute_position_value(&self) -> Decimal {
        self.position_value().abs()
    }
}

/// Unvalidated cell texts of one table row, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Trimmed cells, padded with empty strings up to [`POSITION_CELLS`].
    ///
    /// Extra trailing cells are kept.
    pub fn normalized(&self) -> Vec<String> {
        let mut cells: Vec<String> = self.cells.iter().map(|c| c.trim().to_string()).collect();
        if cells.len() < POSITION_CELLS {
            cells.resize(POSITION_CELLS, String::new());
        }
        cells
    }
}

impl From<Vec<String>> for RawRow {
    fn from(cells: Vec<String>) -> Self {
        Self::new(cells)
    }
}

impl<const N: usize> From<[&str; N]> for RawRow {
    fn from(cells: [&str; N]) -> Self {
        Self::new(cells.iter().map(|c| c.to_string()).collect())
    }
}
