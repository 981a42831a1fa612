use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned box in frame pixel coordinates, `(x1, y1)` top-left and
/// `(x2, y2)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    /// Intersection over union with another box. Zero when either is empty.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Clamp the box into a `width` x `height` frame.
    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }
}

/// Coarse horizontal position of an object relative to the frame center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the position of `bbox` in a frame `frame_width` pixels wide.
///
/// A box centered exactly on the midline counts as `Right`.
pub fn classify_position(bbox: &BoundingBox, frame_width: u32) -> Position {
    if bbox.center_x() < frame_width as f32 / 2.0 {
        Position::Left
    } else {
        Position::Right
    }
}

/// Raw detector output for one object instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
        }
    }
}

/// A detected object annotated with its position in the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bbox: BoundingBox,
    pub position: Position,
}

impl Detection {
    pub fn classify(object: DetectedObject, frame_width: u32) -> Self {
        let position = classify_position(&object.bbox, frame_width);
        Self {
            label: object.label,
            bbox: object.bbox,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered_at(center_x: f32) -> BoundingBox {
        BoundingBox::new(center_x - 5.0, 0.0, center_x + 5.0, 10.0)
    }

    #[test]
    fn test_left_of_center() {
        assert_eq!(classify_position(&centered_at(10.0), 100), Position::Left);
    }

    #[test]
    fn test_right_of_center() {
        assert_eq!(classify_position(&centered_at(90.0), 100), Position::Right);
    }

    #[test]
    fn test_midline_goes_right() {
        assert_eq!(classify_position(&centered_at(50.0), 100), Position::Right);
        assert_eq!(classify_position(&centered_at(49.5), 100), Position::Left);
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::Left.to_string(), "left");
        assert_eq!(Position::Right.to_string(), "right");
        assert_eq!(serde_json::to_string(&Position::Left).unwrap(), "\"left\"");
    }

    #[test]
    fn test_iou() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn test_classify_keeps_label_and_box() {
        let object = DetectedObject::new("dog", BoundingBox::new(60.0, 0.0, 80.0, 20.0), 0.9);
        let detection = Detection::classify(object, 100);
        assert_eq!(detection.label, "dog");
        assert_eq!(detection.position, Position::Right);
        assert_eq!(detection.bbox.x1, 60.0);
    }
}
