//! Domain primitives.

/// Coin/asset symbol as rendered on the page (e.g., "BTC", "kPEPE").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coin(String);

impl Coin {
    /// Create a Coin from a symbol, rejecting blank input.
    pub fn new(coin: impl Into<String>) -> Option<Self> {
        let coin = coin.into();
        if coin.trim().is_empty() {
            None
        } else {
            Some(Coin(coin))
        }
    }

    /// Get the coin as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_display() {
        let coin = Coin::new("BTC").unwrap();
        assert_eq!(coin.to_string(), "BTC");
    }

    #[test]
    fn test_coin_rejects_blank() {
        assert!(Coin::new("").is_none());
        assert!(Coin::new("   ").is_none());
    }
}
