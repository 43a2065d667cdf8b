//! Retrieval pipeline: upload -> chunks -> index, question -> context -> answer

use chrono::Utc;
use ndarray::aview1;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use docqa_core::{
    Answer, AnswerGenerator, Embedder, Error, IndexingReport, PipelineConfig, Result,
    SpeechCapability, TextExtractor,
};
use docqa_extract::{display_name, extension_of, DocumentExtractor};

use crate::chunker::split_text;
use crate::index::NeighborBackend;
use crate::session::Session;

const PREVIEW_CHARS: usize = 100;

/// Orchestrates extraction, chunking, embedding, retrieval and generation.
///
/// The pipeline holds no document state; every call works on the
/// [`Session`] it is given, so one pipeline can serve many sessions.
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn AnswerGenerator>,
    extractor: Arc<dyn TextExtractor>,
    speech: SpeechCapability,
    config: PipelineConfig,
}

impl RetrievalPipeline {
    /// Create a pipeline with the default extractor and no speech output
    pub fn new(embedder: Arc<dyn Embedder>, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self {
            embedder,
            generator,
            extractor: Arc::new(DocumentExtractor::new()),
            speech: SpeechCapability::unavailable("speech output not configured"),
            config: PipelineConfig::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_speech(mut self, speech: SpeechCapability) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn speech(&self) -> &SpeechCapability {
        &self.speech
    }

    pub fn extractor(&self) -> &Arc<dyn TextExtractor> {
        &self.extractor
    }

    /// Empty session sized for this pipeline's embedder
    pub fn new_session(&self) -> Result<Session> {
        Session::new(self.embedder.dimension())
    }

    /// Replace the session's document with the file at `path`
    pub async fn ingest_file<B: NeighborBackend>(
        &self,
        session: &mut Session<B>,
        path: &Path,
    ) -> Result<IndexingReport> {
        session.clear();

        let name = display_name(path);
        info!(file = %name, "processing upload");

        let extension = extension_of(path).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Could not determine file extension for '{}'.",
                name
            ))
        })?;
        self.check_supported(&extension)?;

        let extractor = self.extractor.clone();
        let owned_path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extractor.extract_path(&owned_path))
            .await
            .map_err(|e| Error::Extraction(format!("extraction task failed: {}", e)))??;

        self.index_text(session, &name, &text).await
    }

    /// Replace the session's document with in-memory file contents
    pub async fn ingest_bytes<B: NeighborBackend>(
        &self,
        session: &mut Session<B>,
        name: &str,
        bytes: Vec<u8>,
        extension: &str,
    ) -> Result<IndexingReport> {
        session.clear();

        let extension = normalized_extension(extension);
        self.check_supported(&extension)?;

        let extractor = self.extractor.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract_bytes(&bytes, &extension))
            .await
            .map_err(|e| Error::Extraction(format!("extraction task failed: {}", e)))??;

        self.index_text(session, name, &text).await
    }

    /// Replace the session's document with `text`.
    ///
    /// Chunks whose embedding or insertion fails are logged and skipped; the
    /// upload fails only when no chunk could be indexed.
    pub async fn ingest_text<B: NeighborBackend>(
        &self,
        session: &mut Session<B>,
        name: &str,
        text: &str,
    ) -> Result<IndexingReport> {
        session.clear();
        self.index_text(session, name, text).await
    }

    /// Reject extensions the extractor does not handle before reading anything
    fn check_supported(&self, extension: &str) -> Result<()> {
        let supported = self.extractor.supported_extensions();
        if supported.iter().any(|ext| *ext == extension) {
            Ok(())
        } else {
            warn!(%extension, supported = ?supported, "unsupported upload");
            Err(Error::UnsupportedFormat(extension.to_string()))
        }
    }

    async fn index_text<B: NeighborBackend>(
        &self,
        session: &mut Session<B>,
        name: &str,
        text: &str,
    ) -> Result<IndexingReport> {
        if text.trim().is_empty() {
            return Err(Error::Indexing(format!(
                "Could not extract readable text from '{}'. Check logs.",
                name
            )));
        }

        let chunks = split_text(text, self.config.max_chunk_tokens);
        if chunks.is_empty() {
            return Err(Error::Indexing(
                "Text extracted but could not be split into chunks.".to_string(),
            ));
        }

        info!(file = %name, chunks = chunks.len(), "embedding and indexing chunks");

        let chunks_total = chunks.len();
        let mut errors = Vec::new();

        for (i, chunk) in chunks.into_iter().enumerate() {
            let embedding = match self.embedder.embed(&chunk).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    warn!(chunk = i, preview = %preview(&chunk), error = %e, "could not embed chunk, skipping");
                    errors.push(format!("chunk {}: {}", i, e));
                    continue;
                }
            };

            if let Err(e) = session.index_mut().add(aview1(&embedding), chunk) {
                warn!(chunk = i, error = %e, "could not index chunk, skipping");
                errors.push(format!("chunk {}: {}", i, e));
            }
        }

        let chunks_indexed = session.chunk_count();
        if chunks_indexed == 0 {
            return Err(Error::Indexing(
                "Indexing failed. Could not generate embeddings.".to_string(),
            ));
        }

        let indexed_at = Utc::now();
        session.mark_loaded(name, indexed_at);
        info!(file = %name, chunks_indexed, chunks_failed = errors.len(), "document indexed");

        Ok(IndexingReport {
            source: name.to_string(),
            chunks_total,
            chunks_indexed,
            chunks_failed: errors.len(),
            errors,
            indexed_at,
        })
    }

    /// The chunks most relevant to `question`, nearest first
    pub async fn retrieve<B: NeighborBackend>(
        &self,
        session: &Session<B>,
        question: &str,
    ) -> Result<Vec<String>> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }
        if !session.is_ready() {
            return Err(Error::NotReady);
        }

        let query = self.embedder.embed(question).await.map_err(|e| {
            Error::Embedding(format!(
                "Could not generate embedding for the question: {}",
                e
            ))
        })?;

        let chunks = session.index().search(aview1(&query), self.config.top_k)?;
        if chunks.is_empty() {
            return Err(Error::NoContext);
        }

        debug!(found = chunks.len(), "retrieved context chunks");
        Ok(chunks)
    }

    /// Answer `question` from the session's document
    pub async fn answer<B: NeighborBackend>(
        &self,
        session: &Session<B>,
        question: &str,
    ) -> Result<Answer> {
        let sources = self.retrieve(session, question).await?;
        info!(found = sources.len(), "answering question");

        let context = truncate_context(
            &sources.join(&self.config.context_separator),
            self.config.max_context_chars,
        );
        let prompt = build_prompt(&context, question);

        let generation = self.generator.generate(&prompt).await?;
        let text = generation.text.trim().to_string();

        let audio = if text.is_empty() {
            None
        } else {
            self.speak(&text).await
        };

        Ok(Answer {
            text,
            sources,
            audio,
        })
    }

    /// Best-effort speech for `text`; any failure just means no audio
    async fn speak(&self, text: &str) -> Option<PathBuf> {
        let synth = match &self.speech {
            SpeechCapability::Available(synth) => synth.clone(),
            SpeechCapability::Unavailable { reason } => {
                debug!(%reason, "skipping speech generation");
                return None;
            }
        };

        let temp_path = match tempfile::Builder::new()
            .prefix("docqa-answer-")
            .suffix(".wav")
            .tempfile()
        {
            Ok(file) => file.into_temp_path(),
            Err(e) => {
                error!(error = %e, "could not create audio file");
                return None;
            }
        };

        info!(voice = synth.voice_name(), "generating speech");
        match synth.synthesize_to_file(text, &temp_path).await {
            // dropping the TempPath removes the partial file
            Err(e) => {
                error!(error = %e, "speech synthesis failed");
                None
            }
            Ok(()) => match temp_path.keep() {
                Ok(path) => {
                    info!(path = %path.display(), "speech saved");
                    Some(path)
                }
                Err(e) => {
                    error!(error = %e, "could not keep audio file");
                    None
                }
            },
        }
    }
}

/// Cap `context` at `max_chars` characters, marking the cut with `...`
pub fn truncate_context(context: &str, max_chars: usize) -> String {
    match context.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &context[..cut]),
        None => context.to_string(),
    }
}

/// Prompt handed to the answer generator
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Based *only* on the following context, answer the question. \
         If the context does not contain the answer, say so.\n\
         Context:\n{}\n\nQuestion: {}\n\nAnswer:",
        context, question
    )
}

fn normalized_extension(extension: &str) -> String {
    let lower = extension.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

fn preview(chunk: &str) -> String {
    let mut preview: String = chunk.chars().take(PREVIEW_CHARS).collect();
    if chunk.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
