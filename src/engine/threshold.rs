use crate::domain::{Decimal, Position};

/// Positions whose absolute value is strictly above `threshold`, in input order.
pub fn exceeding_positions(positions: &[Position], threshold: Decimal) -> Vec<&Position> {
    positions
        .iter()
        .filter(|p| p.absolute_position_value() > threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coin;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn pos(coin: &str, size: &str, mark: &str) -> Position {
        Position::new(Coin::new(coin).unwrap(), "", d(size), d(mark)).unwrap()
    }

    #[test]
    fn test_selects_by_absolute_value() {
        let positions = vec![
            pos("BTC", "1", "60000"),
            pos("ETH", "-10", "4000"),
            pos("SOL", "-500", "140"),
        ];

        let exceeding = exceeding_positions(&positions, d("50000"));
        let coins: Vec<&str> = exceeding.iter().map(|p| p.coin().as_str()).collect();
        assert_eq!(coins, vec!["BTC", "SOL"]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let positions = vec![pos("BTC", "1", "50000"), pos("ETH", "-1", "50000.01")];
        let exceeding = exceeding_positions(&positions, d("50000"));
        assert_eq!(exceeding.len(), 1);
        assert_eq!(exceeding[0].coin().as_str(), "ETH");
    }

    #[test]
    fn test_empty_input() {
        assert!(exceeding_positions(&[], d("0")).is_empty());
    }
}
