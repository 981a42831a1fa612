//! Plays alert artifacts and deletes them once playback finishes.
//!
//! Each emitted artifact gets its own watcher thread that polls the player
//! until it goes idle, stops it and removes the file. Watchers are detached:
//! nobody joins or cancels them, and they exit on their own once the file is
//! gone. A watcher may outlive the session that spawned it.

use crate::{AudioError, AudioPlayer};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle of an emitted artifact: `Playing -> Stopped -> Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Playing,
    Stopped,
    Deleted,
    /// Removal failed (usually because the file is already gone). Terminal,
    /// like `Deleted`.
    DeletionFailed,
}

impl ArtifactState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted | Self::DeletionFailed)
    }
}

/// Handle to a detached watcher. Dropping it leaves the watcher running.
pub struct WatcherHandle {
    path: PathBuf,
    handle: JoinHandle<ArtifactState>,
}

impl WatcherHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the watcher has reclaimed its artifact.
    pub fn join(self) -> ArtifactState {
        self.handle.join().unwrap_or(ArtifactState::DeletionFailed)
    }
}

#[derive(Clone)]
pub struct Reclaimer {
    player: Arc<dyn AudioPlayer>,
    /// Held across load+play and across a watcher's idle-check+stop, so a
    /// watcher can never stop a clip that is being started.
    channel: Arc<Mutex<()>>,
    poll_interval: Duration,
}

impl Reclaimer {
    pub fn new(player: Arc<dyn AudioPlayer>) -> Self {
        Self::with_poll_interval(player, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(player: Arc<dyn AudioPlayer>, poll_interval: Duration) -> Self {
        Self {
            player,
            channel: Arc::new(Mutex::new(())),
            poll_interval,
        }
    }

    /// Start playing `artifact` and hand it to a watcher for deletion.
    ///
    /// Returns as soon as playback has started. If loading or playing fails
    /// the artifact is left on disk and the error returned.
    pub fn emit(&self, artifact: PathBuf) -> crate::Result<WatcherHandle> {
        {
            let _channel = self.channel.lock().unwrap_or_else(PoisonError::into_inner);
            self.player.load(&artifact)?;
            self.player.play()?;
        }
        tracing::debug!(path = %artifact.display(), state = ?ArtifactState::Playing, "artifact playing");

        let player = Arc::clone(&self.player);
        let channel = Arc::clone(&self.channel);
        let poll_interval = self.poll_interval;
        let path = artifact.clone();

        let handle = thread::Builder::new()
            .name("artifact-reclaimer".to_string())
            .spawn(move || {
                wait_until_idle(player.as_ref(), &channel, poll_interval);
                tracing::trace!(path = %path.display(), state = ?ArtifactState::Stopped, "artifact stopped");
                delete_artifact(&path)
            })
            .map_err(AudioError::Io)?;

        Ok(WatcherHandle {
            path: artifact,
            handle,
        })
    }

    /// Stop whatever is playing. Used at session teardown.
    pub fn reset(&self) {
        let _channel = self.channel.lock().unwrap_or_else(PoisonError::into_inner);
        self.player.stop();
    }
}

fn wait_until_idle(player: &dyn AudioPlayer, channel: &Mutex<()>, poll_interval: Duration) {
    loop {
        {
            let _channel = channel.lock().unwrap_or_else(PoisonError::into_inner);
            if !player.is_busy() {
                player.stop();
                return;
            }
        }
        thread::sleep(poll_interval);
    }
}

/// Remove an artifact file. Never fails: errors are logged and reported as
/// `DeletionFailed`, so calling this on an already-deleted file is harmless.
pub fn delete_artifact(path: &Path) -> ArtifactState {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "artifact deleted");
            ArtifactState::Deleted
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to delete artifact");
            ArtifactState::DeletionFailed
        }
    }
}
