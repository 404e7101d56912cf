//! Rendering alert and status notifications.
//!
//! Pure functions of their inputs: no I/O, no clock.

use crate::domain::{format_currency, format_quantity, Decimal, Position};

pub const ALERT_SUBJECT: &str = "⚠️ Hyperliquid PERP Position Alert";
pub const STATUS_SUBJECT: &str = "Hyperliquid PERP Position Status";

const ALERT_HEADER: &str = "🚨 Hyperliquid PERP Position Threshold Triggered 🚨";
const AGENT_FOOTER: &str = "Monitoring agent: hypewatch";
const LEVERAGE_PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// At least one position is above the threshold.
    Alert,
    /// Nothing to report.
    Status,
}

/// Subject and plain-text body handed to a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub kind: MessageKind,
    pub subject: String,
    pub body: String,
}

/// Alert when `exceeding` is non-empty, status message otherwise.
pub fn compose_message(exceeding: &[&Position], threshold: Decimal) -> AlertMessage {
    if exceeding.is_empty() {
        AlertMessage {
            kind: MessageKind::Status,
            subject: STATUS_SUBJECT.to_string(),
            body: status_body(threshold),
        }
    } else {
        AlertMessage {
            kind: MessageKind::Alert,
            subject: ALERT_SUBJECT.to_string(),
            body: alert_body(exceeding, threshold),
        }
    }
}

pub fn alert_body(exceeding: &[&Position], threshold: Decimal) -> String {
    let mut lines = vec![
        ALERT_HEADER.to_string(),
        String::new(),
        format!(
            "The following positions exceeded the {} threshold (absolute value):",
            format_currency(threshold)
        ),
        String::new(),
    ];

    for position in exceeding {
        let leverage = match position.leverage() {
            "" => LEVERAGE_PLACEHOLDER,
            leverage => leverage,
        };
        lines.push(format!("- Coin: {}", position.coin()));
        lines.push(format!("  Leverage: {}", leverage));
        lines.push(format!("  Size: {}", format_quantity(position.size())));
        lines.push(format!("  Mark Price: {}", format_currency(position.mark_price())));
        lines.push(format!(
            "  Position Value (Size × Mark): {}",
            format_currency(position.position_value())
        ));
        lines.push(format!(
            "  Absolute Value: {}",
            format_currency(position.absolute_position_value())
        ));
        lines.push(String::new());
    }

    lines.push(AGENT_FOOTER.to_string());
    lines.join("\n")
}

pub fn status_body(threshold: Decimal) -> String {
    format!(
        "No coin exceeds the {} position value threshold.",
        format_currency(threshold)
    )
}

/// One-line summary of a position for logs.
pub fn position_summary(position: &Position) -> String {
    format!(
        "{} | leverage={} | size={} | mark={} | value={} | abs={}",
        position.coin(),
        position.leverage(),
        format_quantity(position.size()),
        format_currency(position.mark_price()),
        format_currency(position.position_value()),
        format_currency(position.absolute_position_value())
    )
}
