//! Report module - summarizing binning runs

pub mod run_report;
pub mod summary;

pub use run_report::*;
pub use summary::*;
