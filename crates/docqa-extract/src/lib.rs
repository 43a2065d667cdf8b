//! Text extraction for uploaded documents
//!
//! Supports `.pdf` (via `pdf-extract`), `.docx` (the `word/document.xml` part
//! read with `zip` + `quick-xml`) and `.txt` (UTF-8 with a Latin-1 fallback).

mod docx;

#[cfg(test)]
mod tests;

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{info, warn};

use docqa_core::{Error, Result, TextExtractor};

/// Extensions understood by [`DocumentExtractor`]
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".txt"];

/// Extractor for the document formats docqa accepts
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_pdf(bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed files
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::Extraction(format!("PDF parse failed: {}", e))),
            Err(_) => Err(Error::Extraction(
                "PDF parser aborted on malformed input".to_string(),
            )),
        }
    }

    fn extract_txt(bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => {
                warn!("UTF-8 decoding failed, falling back to latin-1");
                decode_latin1(bytes)
            }
        }
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract_path(&self, path: &Path) -> Result<String> {
        let name = display_name(path);
        let extension = extension_of(path).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Could not determine file extension for '{}'.",
                name
            ))
        })?;

        info!(file = %name, extension = %extension, "extracting text");
        let bytes = fs::read(path)?;
        self.extract_bytes(&bytes, &extension)
    }

    fn extract_bytes(&self, bytes: &[u8], extension: &str) -> Result<String> {
        let extension = normalize_extension(extension);

        let raw = match extension.as_str() {
            ".pdf" => Self::extract_pdf(bytes)?,
            ".docx" => docx::extract_docx(bytes)?,
            ".txt" => Self::extract_txt(bytes),
            _ => return Err(Error::UnsupportedFormat(extension)),
        };

        let text = clean_text(&raw);
        if text.is_empty() {
            warn!(extension = %extension, "no text could be extracted");
        } else {
            info!(extension = %extension, chars = text.chars().count(), "extracted text");
        }
        Ok(text)
    }

    fn supported_extensions(&self) -> &[&'static str] {
        SUPPORTED_EXTENSIONS
    }
}

/// Lowercased extension of `path` with its leading dot, if it has one
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(normalize_extension)
}

/// File name for log and status messages
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn normalize_extension(extension: &str) -> String {
    let lower = extension.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Decode bytes as ISO-8859-1, which maps every byte to the code point of
/// the same value and therefore never fails.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Trim every line and drop the empty ones
fn clean_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
