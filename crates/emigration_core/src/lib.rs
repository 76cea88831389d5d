pub mod config;
pub mod error;
pub mod logging;

pub use config::{OutputFormat, ReportConfig};
pub use error::{ErrorCategory, ReportError};
