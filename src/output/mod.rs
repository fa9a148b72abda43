//! Report assembly and rendering

pub mod formatter;
pub mod report;

pub use formatter::{OutputFormatter, PageRequest, ReportGenerator};
pub use report::RankingReport;
