//! CLI commands for the risk dashboard.

pub mod collect;
pub mod report;
pub mod serve;

pub use collect::{run_collect, CollectArgs};
pub use report::{run_report, ReportArgs};
pub use serve::{run_serve, ServeArgs};
