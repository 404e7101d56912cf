pub mod config;
pub mod document;
pub mod domain;
pub mod engine;
pub mod error;
pub mod notify;
pub mod orchestration;

pub use config::{Config, NotifierConfig};
pub use document::{Document, DocumentError, DocumentSource, MockDocument, MockSource, WebDriverSource};
pub use domain::{Coin, Decimal, Position, RawRow};
pub use error::MonitorError;
pub use notify::{MockNotifier, Notifier, NotifyError};
pub use orchestration::{CycleReport, Monitor};
