//! Extraction plus keyword review, shared by both surfaces

use std::path::Path;

use docqa_core::{Error, Result, TextExtractor};
use docqa_review::{FlaggedSentence, PolicyReviewer};

/// Review the document at `path`
pub fn review_file(extractor: &dyn TextExtractor, path: &Path) -> Result<Vec<FlaggedSentence>> {
    let text = extractor.extract_path(path)?;
    review_text(&text)
}

/// Review an in-memory document with the given extension
pub fn review_bytes(
    extractor: &dyn TextExtractor,
    bytes: &[u8],
    extension: &str,
) -> Result<Vec<FlaggedSentence>> {
    let text = extractor.extract_bytes(bytes, extension)?;
    review_text(&text)
}

fn review_text(text: &str) -> Result<Vec<FlaggedSentence>> {
    if text.trim().is_empty() {
        return Err(Error::Extraction(
            "Could not extract readable text for review.".to_string(),
        ));
    }
    Ok(PolicyReviewer::new().analyze(text))
}
