//! End-to-end brand monitoring: collect every selected platform, aggregate,
//! analyze, and assemble the final report.

pub mod error;
pub mod pipeline;

pub use error::MonitorError;
pub use pipeline::{run_monitoring, Monitor};
