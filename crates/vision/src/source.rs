use crate::{Frame, VisionError};
use std::path::{Path, PathBuf};

/// Yields successive frames on demand.
///
/// `Ok(None)` marks the end of a finite source. Live sources never end.
pub trait FrameSource {
    fn next_frame(&mut self) -> crate::Result<Option<Frame>>;

    /// Release the underlying device. Called once at session teardown.
    fn release(&mut self) {}
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Replays the images in a directory, in file-name order.
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    pub fn open(dir: impl AsRef<Path>) -> crate::Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            VisionError::DeviceUnavailable(format!("{}: {e}", dir.display()))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(VisionError::DeviceUnavailable(format!(
                "no images in {}",
                dir.display()
            )));
        }

        tracing::info!(dir = %dir.display(), frames = paths.len(), "Image directory opened");
        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> crate::Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        let image = image::open(path)
            .map_err(|e| VisionError::FrameRead(format!("{}: {e}", path.display())))?
            .to_rgb8();
        let frame = Frame::new(image, self.next as u64);
        self.next += 1;
        Ok(Some(frame))
    }
}
