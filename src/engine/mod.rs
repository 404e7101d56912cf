//! Extraction and decision pipeline: find the table, read its rows, build
//! positions, decide whether to alert.

pub mod builder;
pub mod compose;
pub mod locator;
pub mod poll;
pub mod rows;
pub mod threshold;
pub mod wait;

pub use builder::{build_positions, parse_row, BuildReport, RowRejection};
pub use compose::{compose_message, position_summary, AlertMessage, MessageKind};
pub use locator::{HeaderKeywords, HeadingProximity, TableLocator, TableStrategy};
pub use poll::{PollTimeout, Poller, Ready};
pub use rows::{collect_rows, count_rows, row_queries};
pub use threshold::exceeding_positions;
pub use wait::await_ready_table;
