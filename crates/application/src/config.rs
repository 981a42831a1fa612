use crate::constants::{default_artifact_dir, FRAME_INTERVAL, RECLAIM_POLL_INTERVAL};
use serde::{Deserialize, Serialize};
use sightassist_alerts::{DEFAULT_ALERT_CATEGORIES, DEFAULT_COOLDOWN};
use sightassist_speech::SpeechConfig;
use sightassist_vision::YoloParams;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
        }
    }
}

/// Settings for a detection session. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum seconds between two alerts for the same label.
    pub cooldown_secs: u64,
    pub frame_interval_ms: u64,
    pub reclaim_poll_ms: u64,
    /// Labels that may be announced. Empty means all labels.
    pub alert_categories: Vec<String>,
    /// Initial state of the alert toggle.
    pub alerts_enabled: bool,
    pub artifact_dir: PathBuf,
    pub speech: SpeechConfig,
    pub detector: YoloParams,
    pub camera: CameraConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN.as_secs(),
            frame_interval_ms: FRAME_INTERVAL.as_millis() as u64,
            reclaim_poll_ms: RECLAIM_POLL_INTERVAL.as_millis() as u64,
            alert_categories: DEFAULT_ALERT_CATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            alerts_enabled: false,
            artifact_dir: default_artifact_dir(),
            speech: SpeechConfig::default(),
            detector: YoloParams::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Config loaded from {:?}", path);
        Ok(config)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn reclaim_poll_interval(&self) -> Duration {
        Duration::from_millis(self.reclaim_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cooldown(), Duration::from_secs(10));
        assert_eq!(config.frame_interval(), Duration::from_millis(100));
        assert_eq!(config.reclaim_poll_interval(), Duration::from_millis(100));
        assert!(!config.alerts_enabled);
        assert!(config.alert_categories.contains(&"knife".to_string()));
        assert!(config.artifact_dir.ends_with("audio_temp_files"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"cooldown_secs": 3, "alert_categories": ["person"], "speech": {"language": "es"}}"#,
        )
        .unwrap();

        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.cooldown(), Duration::from_secs(3));
        assert_eq!(config.alert_categories, vec!["person"]);
        assert_eq!(config.speech.language, "es");
        assert_eq!(config.speech.timeout_secs, 10);
        assert_eq!(config.frame_interval_ms, 100);
        assert_eq!(config.detector.input_size, 640);
    }

    #[test]
    fn test_missing_file() {
        let result = SessionConfig::load(Path::new("/nonexistent/sightassist.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            SessionConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
