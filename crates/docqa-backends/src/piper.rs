//! Piper text-to-speech via its command line

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

use docqa_core::{Error, Result, SpeechCapability, SpeechSynthesizer};

use crate::config::PiperConfig;

/// Speech synthesizer that shells out to the `piper` binary
pub struct PiperSynthesizer {
    config: PiperConfig,
    voice: String,
}

impl PiperSynthesizer {
    pub fn new(config: PiperConfig) -> Self {
        let voice = config
            .model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "piper".to_string());
        Self { config, voice }
    }

    /// Decide once whether speech output can be offered.
    ///
    /// Only the voice files are checked here; a missing binary shows up as a
    /// logged synthesis failure on first use.
    pub fn resolve(config: PiperConfig) -> SpeechCapability {
        let missing = [&config.model, &config.config]
            .into_iter()
            .find(|path| !path.is_file())
            .map(|path| path.display().to_string());

        match missing {
            Some(path) => {
                let reason = format!("voice file {} not found", path);
                warn!(%reason, "speech output disabled");
                SpeechCapability::unavailable(reason)
            }
            None => {
                info!(model = %config.model.display(), "speech output enabled");
                SpeechCapability::Available(Arc::new(Self::new(config)))
            }
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for PiperSynthesizer {
    async fn synthesize_to_file(&self, text: &str, output: &Path) -> Result<()> {
        let mut child = Command::new(&self.config.binary)
            .arg("--model")
            .arg(&self.config.model)
            .arg("--config")
            .arg(&self.config.config)
            .arg("--output_file")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Speech(format!(
                    "could not start {}: {}",
                    self.config.binary.display(),
                    e
                ))
            })?;

        // feed stdin while wait_with_output drains stderr
        let stdin = child.stdin.take();
        let input = text.to_owned();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Speech(format!(
                "piper exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }
        writer
            .await
            .map_err(|e| Error::Speech(format!("could not feed text to piper: {}", e)))??;

        let written = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(Error::Speech("piper produced no audio".to_string()));
        }
        Ok(())
    }

    fn voice_name(&self) -> &str {
        &self.voice
    }
}
