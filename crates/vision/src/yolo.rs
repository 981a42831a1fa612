//! YOLOv8 object detection over ONNX Runtime.
//!
//! Expects a standard Ultralytics export: one `[1, 3, S, S]` float input and
//! one `[1, 4 + classes, anchors]` output with boxes as center/size in input
//! pixel coordinates.

use crate::labels::label_for_class;
use crate::{BoundingBox, DetectedObject, Frame, ObjectDetector, VisionError};
use image::imageops::{self, FilterType};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoloParams {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}

#[derive(Debug)]
pub struct YoloDetector {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    params: YoloParams,
    model_name: String,
}

impl YoloDetector {
    pub fn load(model_path: impl AsRef<Path>, params: YoloParams) -> crate::Result<Self> {
        let model_path = model_path.as_ref();
        let session = Session::builder()
            .map_err(|e| VisionError::Model(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| VisionError::Model(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| VisionError::Model(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| VisionError::Model("model has no inputs".to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| VisionError::Model("model has no outputs".to_string()))?;

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "yolo".to_string());

        tracing::info!(model = %model_name, input = %input_name, "YOLO model loaded");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            params,
            model_name,
        })
    }

    pub fn params(&self) -> &YoloParams {
        &self.params
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, frame: &Frame) -> crate::Result<Vec<DetectedObject>> {
        let size = self.params.input_size;
        let input = Tensor::from_array((
            [1i64, 3, size as i64, size as i64],
            preprocess(frame, size),
        ))
        .map_err(|e| VisionError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::Inference("lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| VisionError::Inference(e.to_string()))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| VisionError::Inference("missing model output".to_string()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::Inference(e.to_string()))?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        if dims.len() != 3 || dims[1] < 5 {
            return Err(VisionError::Inference(format!(
                "unexpected output shape {dims:?}"
            )));
        }
        let channels = dims[1] as usize;
        let anchors = dims[2] as usize;

        let scale_x = frame.width() as f32 / size as f32;
        let scale_y = frame.height() as f32 / size as f32;

        let candidates = decode_output(
            data,
            channels,
            anchors,
            self.params.conf_threshold,
            (scale_x, scale_y),
            (frame.width() as f32, frame.height() as f32),
        );
        let kept = non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        );

        Ok(kept
            .into_iter()
            .map(|c| DetectedObject::new(label_for_class(c.class_id), c.bbox, c.confidence))
            .collect())
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Resize to the square model input and lay out as normalized CHW floats.
fn preprocess(frame: &Frame, size: u32) -> Vec<f32> {
    let resized = imageops::resize(&frame.image, size, size, FilterType::Triangle);
    let plane = (size * size) as usize;
    let mut data = vec![0.0f32; plane * 3];

    for (i, pixel) in resized.pixels().enumerate() {
        data[i] = pixel[0] as f32 / 255.0;
        data[plane + i] = pixel[1] as f32 / 255.0;
        data[2 * plane + i] = pixel[2] as f32 / 255.0;
    }
    data
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    class_id: usize,
    confidence: f32,
    bbox: BoundingBox,
}

/// Decode a channel-major `[channels, anchors]` output into frame-space
/// candidates above `threshold`.
fn decode_output(
    data: &[f32],
    channels: usize,
    anchors: usize,
    threshold: f32,
    scale: (f32, f32),
    frame_size: (f32, f32),
) -> Vec<Candidate> {
    let at = |c: usize, a: usize| data[c * anchors + a];
    let mut candidates = Vec::new();

    for a in 0..anchors {
        let (class_id, confidence) = (4..channels)
            .map(|c| (c - 4, at(c, a)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if confidence < threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, a), at(1, a), at(2, a), at(3, a));
        let bbox = BoundingBox::new(
            (cx - w / 2.0) * scale.0,
            (cy - h / 2.0) * scale.1,
            (cx + w / 2.0) * scale.0,
            (cy + h / 2.0) * scale.1,
        )
        .clamp_to(frame_size.0, frame_size.1);

        candidates.push(Candidate {
            class_id,
            confidence,
            bbox,
        });
    }

    candidates
}

/// Class-wise greedy NMS, highest confidence first.
fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let overlaps = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Build a `[4 + classes, anchors]` buffer from per-anchor rows.
    fn output(rows: &[[f32; 7]]) -> Vec<f32> {
        let anchors = rows.len();
        let mut data = vec![0.0; 7 * anchors];
        for (a, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                data[c * anchors + a] = *value;
            }
        }
        data
    }

    #[test]
    fn test_decode_picks_best_class_and_scales() {
        // cx, cy, w, h, class0, class1, class2
        let data = output(&[
            [100.0, 100.0, 40.0, 20.0, 0.1, 0.8, 0.3],
            [300.0, 300.0, 10.0, 10.0, 0.1, 0.1, 0.1],
        ]);

        let candidates = decode_output(&data, 7, 2, 0.25, (2.0, 1.0), (1280.0, 640.0));

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].class_id, 1);
        assert!((candidates[0].confidence - 0.8).abs() < 1e-6);
        assert_eq!(candidates[0].bbox, BoundingBox::new(160.0, 90.0, 240.0, 110.0));
    }

    #[test]
    fn test_decode_clamps_to_frame() {
        let data = output(&[[5.0, 5.0, 20.0, 20.0, 0.9, 0.0, 0.0]]);
        let candidates = decode_output(&data, 7, 1, 0.25, (1.0, 1.0), (640.0, 640.0));
        assert_eq!(candidates[0].bbox.x1, 0.0);
        assert_eq!(candidates[0].bbox.y1, 0.0);
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap() {
        let a = Candidate {
            class_id: 0,
            confidence: 0.9,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        };
        let b = Candidate {
            class_id: 0,
            confidence: 0.7,
            bbox: BoundingBox::new(1.0, 1.0, 11.0, 11.0),
        };
        let c = Candidate {
            class_id: 1,
            confidence: 0.6,
            bbox: BoundingBox::new(1.0, 1.0, 11.0, 11.0),
        };

        let kept = non_max_suppression(vec![b, c.clone(), a.clone()], 0.45, 100);
        assert_eq!(kept, vec![a, c]);
    }

    #[test]
    fn test_nms_respects_max_detections() {
        let candidates = (0..5)
            .map(|i| Candidate {
                class_id: 0,
                confidence: 0.5 + i as f32 * 0.1,
                bbox: BoundingBox::new(i as f32 * 100.0, 0.0, i as f32 * 100.0 + 10.0, 10.0),
            })
            .collect();
        assert_eq!(non_max_suppression(candidates, 0.45, 3).len(), 3);
    }

    #[test]
    fn test_preprocess_layout() {
        let image = RgbImage::from_pixel(4, 4, Rgb([255, 0, 51]));
        let data = preprocess(&Frame::new(image, 0), 2);

        assert_eq!(data.len(), 12);
        assert!(data[..4].iter().all(|v| (*v - 1.0).abs() < 1e-6));
        assert!(data[4..8].iter().all(|v| *v == 0.0));
        assert!(data[8..].iter().all(|v| (*v - 0.2).abs() < 1e-6));
    }
}
