//! Suite-end tooling for mockhard.
//!
//! This crate provides:
//! - Suite gate: verify every fake of a context once the suite has finished
//! - Reports: markdown and JSON renderings with a stable content digest
//! - Log summaries: rebuild a report from a JSONL event log after the fact

#![forbid(unsafe_code)]

pub mod error;
pub mod gate;
pub mod log_summary;
pub mod report;

pub use error::HarnessError;
pub use gate::SuiteGate;
pub use log_summary::{summarize_log_file, summarize_log_text};
pub use report::GateReport;
