//! Policy review: flag sentences containing obligation keywords and export
//! them as a spreadsheet report.

mod report;
mod reviewer;

#[cfg(test)]
mod tests;

pub use report::{export_report, write_report, DEFAULT_REPORT_PATH};
pub use reviewer::{FlaggedSentence, PolicyReviewer, DEFAULT_KEYWORDS};

// Re-export core types for convenience
pub use docqa_core::{Error, Result};
