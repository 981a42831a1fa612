//! Frame acquisition, object detection and per-detection geometry.
//!
//! The detector and the frame source are reached through traits so the
//! session loop can run against a webcam and an ONNX model in production and
//! against scripted fakes in tests.

mod annotate;
#[cfg(target_os = "linux")]
mod camera;
mod detection;
mod detector;
mod frame;
mod labels;
mod source;
mod yolo;

pub use annotate::{annotate, BOX_COLOR, BOX_THICKNESS};
#[cfg(target_os = "linux")]
pub use camera::{Camera, CameraSettings};
pub use detection::{classify_position, BoundingBox, DetectedObject, Detection, Position};
pub use detector::ObjectDetector;
pub use frame::Frame;
pub use labels::{label_for_class, COCO_LABELS};
pub use source::{FrameSource, ImageDirSource};
pub use yolo::{YoloDetector, YoloParams};

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("video device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("failed to read frame: {0}")]
    FrameRead(String),
    #[error("failed to load model: {0}")]
    Model(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VisionError>;
