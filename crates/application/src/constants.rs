use std::path::PathBuf;
use std::time::Duration;

/// Pause between loop iterations; caps the frame rate at about 10 fps.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// How often a reclaimer watcher asks the player whether it is still busy.
pub const RECLAIM_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const APP_DIR_NAME: &str = "sightassist";

pub const ARTIFACT_DIR_NAME: &str = "audio_temp_files";

/// Where synthesized alert audio lives until it has been played.
pub fn default_artifact_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(ARTIFACT_DIR_NAME)
}
