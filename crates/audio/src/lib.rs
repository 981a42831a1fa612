mod player;
mod reclaimer;

pub use player::RodioPlayer;
pub use reclaimer::{delete_artifact, ArtifactState, Reclaimer, WatcherHandle, DEFAULT_POLL_INTERVAL};

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),
    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("nothing loaded")]
    NothingLoaded,
    #[error("playback worker has shut down")]
    WorkerGone,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// A single playback channel. Loading and playing a new file replaces
/// whatever is currently playing.
pub trait AudioPlayer: Send + Sync {
    fn load(&self, path: &Path) -> Result<()>;

    fn play(&self) -> Result<()>;

    fn is_busy(&self) -> bool;

    /// Halt playback and release the current file. Synchronous: when this
    /// returns the file may be deleted.
    fn stop(&self);
}
