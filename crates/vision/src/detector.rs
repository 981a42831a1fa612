use crate::{DetectedObject, Frame};

/// Black-box object detector: frame in, labelled boxes out.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> crate::Result<Vec<DetectedObject>>;

    fn name(&self) -> &str;
}
