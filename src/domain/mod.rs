//! Domain types for the perpetual position monitor.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Tolerant parsing of numbers from rendered page text, and display formatting
//! - Position and RawRow records

pub mod decimal;
pub mod position;
pub mod primitives;

pub use decimal::{format_currency, format_quantity, parse_numeric_text, Decimal};
pub use position::{Position, RawRow, POSITION_CELLS};
pub use primitives::Coin;
