//! CSV report export for flagged sentences

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::reviewer::FlaggedSentence;
use docqa_core::{Error, Result};

pub const DEFAULT_REPORT_PATH: &str = "review_report.csv";

const HEADER: [&str; 3] = ["Sentence", "Keywords Found", "Suggestion"];

/// Write `records` as CSV with a header row
pub fn write_report<W: Write>(records: &[FlaggedSentence], writer: W) -> Result<()> {
    if records.is_empty() {
        return Err(Error::NothingFlagged);
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER).map_err(csv_error)?;
    for record in records {
        csv.write_record([
            record.sentence.as_str(),
            record.keywords_found().as_str(),
            record.suggestion.as_str(),
        ])
        .map_err(csv_error)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the report to a file at `path`, replacing any existing file
pub fn export_report(records: &[FlaggedSentence], path: &Path) -> Result<()> {
    if records.is_empty() {
        return Err(Error::NothingFlagged);
    }

    let file = File::create(path)?;
    write_report(records, file)?;
    info!(path = %path.display(), rows = records.len(), "review report written");
    Ok(())
}

fn csv_error(err: csv::Error) -> Error {
    Error::Serialization(format!("could not write report: {}", err))
}
