use std::path::PathBuf;

/// Errors that end a session. Audio-path failures never surface here: they
/// are logged and the alert is dropped.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not access the camera: {0}")]
    DeviceUnavailable(String),

    #[error("failed to capture video: {0}")]
    FrameRead(String),

    #[error("object detection failed: {0}")]
    Detection(String),

    #[error("failed to prepare audio directory '{path}': {source}")]
    ArtifactDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;
