//! Mapping raw table rows onto validated positions.

use crate::domain::{parse_numeric_text, Coin, Position, RawRow};
use std::fmt;
use tracing::warn;

/// A data row that could not become a [`Position`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// Trimmed, padded cells of the offending row.
    pub cells: Vec<String>,
    /// Required fields that were empty or unparsable, or `position value`
    /// when size × mark price does not fit a decimal.
    pub missing: Vec<&'static str>,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing {} in {:?}", self.missing.join(", "), self.cells)
    }
}

/// Positions extracted from a table, plus the rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub positions: Vec<Position>,
    pub rejected: Vec<RowRejection>,
}

/// Parse one row.
///
/// `Ok(None)` means the row carries no position at all: an empty row or the
/// header row repeated inside the body.
pub fn parse_row(row: &RawRow) -> Result<Option<Position>, RowRejection> {
    if row.is_empty() {
        return Ok(None);
    }

    let cells = row.normalized();
    if cells[0].to_uppercase() == "COIN" {
        return Ok(None);
    }

    let coin = Coin::new(cells[0].as_str());
    let size = parse_numeric_text(Some(cells[2].as_str()));
    let mark_price = parse_numeric_text(Some(cells[3].as_str()));

    match (coin, size, mark_price) {
        (Some(coin), Some(size), Some(mark_price)) => {
            match Position::new(coin, cells[1].as_str(), size, mark_price) {
                Some(position) => Ok(Some(position)),
                None => Err(RowRejection {
                    cells,
                    missing: vec!["position value"],
                }),
            }
        }
        (coin, size, mark_price) => {
            let missing = [
                ("coin", coin.is_none()),
                ("size", size.is_none()),
                ("mark price", mark_price.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();
            Err(RowRejection { cells, missing })
        }
    }
}

/// Turn rows into positions, preserving order and logging every dropped row.
pub fn build_positions(rows: &[RawRow]) -> BuildReport {
    let mut report = BuildReport::default();

    for row in rows {
        match parse_row(row) {
            Ok(Some(position)) => report.positions.push(position),
            Ok(None) => {}
            Err(rejection) => {
                warn!("Skipping row due to missing data: {}", rejection);
                report.rejected.push(rejection);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Decimal;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_parse_row_valid() {
        let position = parse_row(&RawRow::from(["BTC", "5x", "2.5", "60000"]))
            .unwrap()
            .unwrap();
        assert_eq!(position.coin().as_str(), "BTC");
        assert_eq!(position.leverage(), "5x");
        assert_eq!(position.position_value(), d("150000"));
        assert_eq!(position.absolute_position_value(), d("150000"));
    }

    #[test]
    fn test_parse_row_noisy_cells() {
        let position = parse_row(&RawRow::from([" ETH ", " ", "-1,250.5 ETH", "$3,000.00 USD", "extra"]))
            .unwrap()
            .unwrap();
        assert_eq!(position.coin().as_str(), "ETH");
        assert_eq!(position.leverage(), "");
        assert_eq!(position.size(), d("-1250.5"));
        assert_eq!(position.mark_price(), d("3000.00"));
    }

    #[test]
    fn test_parse_row_skips_repeated_header() {
        for header in ["COIN", "Coin", "coin", " coin "] {
            let row = RawRow::from([header, "Leverage", "1", "2"]);
            assert_eq!(parse_row(&row), Ok(None), "header {:?}", header);
        }
    }

    #[test]
    fn test_parse_row_short_row_rejected() {
        let rejection = parse_row(&RawRow::from(["ETH", "10x"])).unwrap_err();
        assert_eq!(rejection.cells, vec!["ETH", "10x", "", ""]);
        assert_eq!(rejection.missing, vec!["size", "mark price"]);
    }

    #[test]
    fn test_parse_row_missing_coin_rejected() {
        let rejection = parse_row(&RawRow::from(["", "3x", "1", "100"])).unwrap_err();
        assert_eq!(rejection.missing, vec!["coin"]);
    }

    #[test]
    fn test_parse_row_never_defaults_to_zero() {
        let rejection = parse_row(&RawRow::from(["SOL", "3x", "N/A", "150"])).unwrap_err();
        assert_eq!(rejection.missing, vec!["size"]);
    }

    #[test]
    fn test_parse_row_rejects_overflowing_value() {
        let row = RawRow::from(["BTC", "5x", "100,000,000,000,000", "$1,000,000,000,000,000"]);
        let rejection = parse_row(&row).unwrap_err();
        assert_eq!(rejection.missing, vec!["position value"]);
        assert_eq!(rejection.cells[0], "BTC");
    }

    #[test]
    fn test_build_positions_preserves_order_and_reports_drops() {
        let rows = vec![
            RawRow::from(["Coin", "Leverage", "Size", "Mark Price"]),
            RawRow::from(["BTC", "5x", "2.5", "60000"]),
            RawRow::from(["BAD", "1x", "--", "1"]),
            RawRow::new(Vec::new()),
            RawRow::from(["ETH", "10x", "-20", "3500"]),
        ];

        let report = build_positions(&rows);
        let coins: Vec<&str> = report.positions.iter().map(|p| p.coin().as_str()).collect();
        assert_eq!(coins, vec!["BTC", "ETH"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].cells[0], "BAD");
    }
}
