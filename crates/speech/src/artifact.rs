use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ARTIFACT_PREFIX: &str = "temp_";
pub const ARTIFACT_EXTENSION: &str = "mp3";

/// Give up after this many name collisions in the same microsecond.
const MAX_SUFFIX: u32 = 1000;

/// Create a new artifact file named after `now` with microsecond resolution.
///
/// The file is opened with `create_new`, so concurrent callers never share a
/// name. On collision a numeric suffix is appended.
pub fn create_artifact(dir: &Path, now: DateTime<Local>) -> std::io::Result<(PathBuf, File)> {
    let stem = format!("{ARTIFACT_PREFIX}{}", now.format("%Y%m%d_%H%M%S_%6f"));

    for suffix in 0..MAX_SUFFIX {
        let name = if suffix == 0 {
            format!("{stem}.{ARTIFACT_EXTENSION}")
        } else {
            format!("{stem}_{suffix}.{ARTIFACT_EXTENSION}")
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free artifact name for {stem}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_name_has_microsecond_timestamp() {
        let dir = tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
            + chrono::Duration::microseconds(42);

        let (path, _file) = create_artifact(dir.path(), now).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "temp_20240309_140507_000042.mp3"
        );
        assert!(path.exists());
    }

    #[test]
    fn test_same_instant_gets_unique_names() {
        let dir = tempdir().unwrap();
        let now = Local::now();

        let (first, _) = create_artifact(dir.path(), now).unwrap();
        let (second, _) = create_artifact(dir.path(), now).unwrap();
        let (third, _) = create_artifact(dir.path(), now).unwrap();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert!(second.to_str().unwrap().ends_with("_1.mp3"));
        assert!(third.to_str().unwrap().ends_with("_2.mp3"));
    }

    #[test]
    fn test_missing_directory_fails() {
        let result = create_artifact(Path::new("/nonexistent/sightassist"), Local::now());
        assert!(result.is_err());
    }
}
