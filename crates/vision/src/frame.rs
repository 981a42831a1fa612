use image::RgbImage;

/// One captured video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Position of this frame in its source, starting at zero.
    pub index: u64,
}

impl Frame {
    pub fn new(image: RgbImage, index: u64) -> Self {
        Self { image, index }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
