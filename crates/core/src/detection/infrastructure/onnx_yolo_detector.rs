/// YOLO object detector using ONNX Runtime via `ort`.
///
/// Expects an anchor-free detection head (YOLOv8 / YOLO11 export) whose
/// output is `[1, 4 + C, N]` or `[1, N, 4 + C]`: box center, size, then one
/// score per class. Handles letterbox preprocessing, per-class NMS and
/// filtering to the run's vocabulary.
use std::path::Path;

use crate::detection::domain::class_vocabulary::ClassVocabulary;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::bbox::{nms, BoundingBox};
use crate::shared::frame::Frame;

use super::coco_labels::label_for;

/// Fallback input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.35;

const NMS_IOU_THRESH: f64 = 0.45;

/// Box coordinates and size precede the class scores in each row.
const BOX_VALUES: usize = 4;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model. The input resolution is read from the model's
    /// NCHW input shape, falling back to 640 when it is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!("Loaded detection model {} ({input_size}px input)", model_path.display());

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        classes: &ClassVocabulary,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(letterboxed.tensor.clone())?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor
            .as_slice()
            .ok_or("YOLO output tensor is not contiguous")?;

        let candidates = decode_output(data, &shape, self.confidence, &letterboxed)?;
        let detections = select(candidates, classes, frame.width(), frame.height());
        log::debug!(
            "Frame {}: {} detections for [{classes}]",
            frame.index(),
            detections.len()
        );
        Ok(detections)
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

struct Letterbox {
    tensor: ndarray::Array4<f32>,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

/// Letterbox-resize a frame into a `target_size` square NCHW float tensor.
fn letterbox(frame: &Frame, target_size: u32) -> Letterbox {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // 114/255 gray padding, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterbox {
        tensor,
        scale,
        pad_x,
        pad_y,
    }
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Candidate {
    bbox: BoundingBox,
    confidence: f64,
    class_id: usize,
}

/// Parses raw head output into candidates above `confidence`, with boxes
/// mapped back to source frame coordinates.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    letterbox: &Letterbox,
) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    // Exports disagree on layout; the feature axis is always the short one.
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats <= BOX_VALUES {
        return Err(format!("YOLO output has no class scores: {shape:?}").into());
    }
    if data.len() < num_dets * num_feats {
        return Err("YOLO output shorter than its shape".into());
    }

    let value = |det: usize, feat: usize| -> f64 {
        if transposed {
            data[feat * num_dets + det] as f64
        } else {
            data[det * num_feats + feat] as f64
        }
    };

    let scale = letterbox.scale;
    let pad_x = letterbox.pad_x as f64;
    let pad_y = letterbox.pad_y as f64;

    let mut candidates = Vec::new();
    for i in 0..num_dets {
        let (class_id, score) = (BOX_VALUES..num_feats)
            .map(|f| (f - BOX_VALUES, value(i, f)))
            .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if score < confidence {
            continue;
        }

        let cx = value(i, 0);
        let cy = value(i, 1);
        let w = value(i, 2);
        let h = value(i, 3);

        candidates.push(Candidate {
            bbox: BoundingBox::new(
                (cx - w / 2.0 - pad_x) / scale,
                (cy - h / 2.0 - pad_y) / scale,
                (cx + w / 2.0 - pad_x) / scale,
                (cy + h / 2.0 - pad_y) / scale,
            ),
            confidence: score,
            class_id,
        });
    }
    Ok(candidates)
}

/// Keeps candidates whose label is in the vocabulary, then runs NMS within
/// each class. Output is ordered by confidence, highest first.
fn select(
    candidates: Vec<Candidate>,
    classes: &ClassVocabulary,
    frame_w: u32,
    frame_h: u32,
) -> Vec<Detection> {
    let wanted: Vec<(Candidate, String)> = candidates
        .into_iter()
        .map(|c| {
            let label = label_for(c.class_id);
            (c, label)
        })
        .filter(|(_, label)| classes.contains(label))
        .collect();

    let mut class_ids: Vec<usize> = wanted.iter().map(|(c, _)| c.class_id).collect();
    class_ids.sort_unstable();
    class_ids.dedup();

    let mut detections = Vec::new();
    for class_id in class_ids {
        let members: Vec<&(Candidate, String)> =
            wanted.iter().filter(|(c, _)| c.class_id == class_id).collect();
        let boxes: Vec<(BoundingBox, f64)> =
            members.iter().map(|(c, _)| (c.bbox, c.confidence)).collect();
        for keep in nms(&boxes, NMS_IOU_THRESH) {
            let (candidate, label) = members[keep];
            detections.push(Detection::new(
                candidate.bbox.clamp(frame_w, frame_h),
                candidate.confidence,
                candidate.class_id,
                label.clone(),
            ));
        }
    }

    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    detections
}
