pub mod cycle;

pub use cycle::{CycleReport, Monitor};
