use image::{ImageFormat, RgbImage};
use sightassist_application::FrameSink;
use sightassist_vision::Detection;
use std::path::{Path, PathBuf};

/// Rewrites a JPEG with the latest annotated frame. The file is replaced
/// atomically so an image viewer never sees a half-written frame.
pub struct PreviewSink {
    path: PathBuf,
    staging: PathBuf,
    failing: bool,
}

impl PreviewSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let staging = path.with_extension("partial.jpg");
        Self {
            path,
            staging,
            failing: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, image: &RgbImage) -> image::ImageResult<()> {
        image.save_with_format(&self.staging, ImageFormat::Jpeg)?;
        std::fs::rename(&self.staging, &self.path)?;
        Ok(())
    }
}

impl FrameSink for PreviewSink {
    fn present(&mut self, image: &RgbImage, _detections: &[Detection]) {
        match self.write(image) {
            Ok(()) => self.failing = false,
            // Log once per failure streak, not once per frame.
            Err(e) if !self.failing => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to write preview");
                self.failing = true;
            }
            Err(_) => {}
        }
    }
}
