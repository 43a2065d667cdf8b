//! Speech synthesis trait and the startup-resolved capability wrapper

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::Result;

/// Trait for text-to-speech engines
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and write a WAV file at `output`
    async fn synthesize_to_file(&self, text: &str, output: &Path) -> Result<()>;

    /// Human readable voice name, used in logs
    fn voice_name(&self) -> &str;
}

/// Whether speech output is available for this process.
///
/// Resolved once at startup; call sites match on it instead of probing for
/// model files on every request.
#[derive(Clone)]
pub enum SpeechCapability {
    Available(Arc<dyn SpeechSynthesizer>),
    Unavailable { reason: String },
}

impl SpeechCapability {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        SpeechCapability::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SpeechCapability::Available(_))
    }

    pub fn synthesizer(&self) -> Option<&Arc<dyn SpeechSynthesizer>> {
        match self {
            SpeechCapability::Available(synth) => Some(synth),
            SpeechCapability::Unavailable { .. } => None,
        }
    }
}

impl fmt::Debug for SpeechCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechCapability::Available(synth) => f
                .debug_tuple("Available")
                .field(&synth.voice_name())
                .finish(),
            SpeechCapability::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}
