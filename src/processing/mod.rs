//! Batch Processing
//!
//! Runs the converter over a list of files and collects a combined report.

pub mod batch;
pub mod report;

pub use batch::{BatchConverter, BatchInput};
pub use report::BatchReport;
