//! Error types for docqa

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the docqa system
///
/// The last three user-facing variants carry the exact message shown to the
/// person asking the question, so surfaces can print `to_string()` directly.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding shape {shape:?} does not match index dimension {dimension} (expected ({dimension},) or (1, {dimension}))")]
    ShapeMismatch { shape: Vec<usize>, dimension: usize },

    #[error("Unsupported file extension '{0}'")]
    UnsupportedFormat(String),

    #[error("Text extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("{0}")]
    Indexing(String),

    #[error("Please enter a question.")]
    EmptyQuestion,

    #[error("Please upload and index a document first.")]
    NotReady,

    #[error("Could not find relevant context in the document.")]
    NoContext,

    #[error("Policy analysis did not produce results.")]
    NothingFlagged,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Whether this error is caused by the caller's input rather than by a
    /// failing collaborator.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::ShapeMismatch { .. }
                | Error::UnsupportedFormat(_)
                | Error::EmptyQuestion
                | Error::NotReady
                | Error::NoContext
                | Error::NothingFlagged
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
