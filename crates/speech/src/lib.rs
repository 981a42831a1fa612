//! Text-to-speech for spoken alerts.
//!
//! A synthesizer turns one sentence into one audio file in a caller-chosen
//! directory. The file is the caller's to play and delete.

mod artifact;
mod google;

pub use artifact::{create_artifact, ARTIFACT_EXTENSION, ARTIFACT_PREFIX};
pub use google::{split_text, GoogleTts, SpeechConfig, MAX_CHUNK_CHARS};

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("nothing to synthesize")]
    EmptyText,
    #[error("speech service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("speech service returned no audio")]
    EmptyResponse,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpeechError>;

pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into a new, uniquely named file under `out_dir`.
    fn synthesize(&self, text: &str, out_dir: &Path) -> Result<PathBuf>;

    fn name(&self) -> &str;
}
