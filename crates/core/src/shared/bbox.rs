//! Axis-aligned boxes in frame pixel coordinates.

use serde::{Deserialize, Serialize};

/// Box corners as `(x1, y1)` top-left and `(x2, y2)` bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clamps the box to a `width` × `height` frame.
    pub fn clamp(&self, width: u32, height: u32) -> BoundingBox {
        let w = width as f64;
        let h = height as f64;
        BoundingBox {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }

    /// Integer pixel span `(x0, y0, x1, y1)` covered by the box, end-exclusive.
    pub fn pixel_span(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let c = self.clamp(width, height);
        (
            c.x1.floor() as u32,
            c.y1.floor() as u32,
            c.x2.ceil() as u32,
            c.y2.ceil() as u32,
        )
    }
}

/// Greedy non-maximum suppression over `(box, score)` pairs.
///
/// Returns the indices of kept entries, highest score first.
pub fn nms(boxes: &[(BoundingBox, f64)], iou_thresh: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        boxes[b]
            .1
            .partial_cmp(&boxes[a].1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];
    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);
        for &j in &order[pos + 1..] {
            if !suppressed[j] && boxes[i].0.iou(&boxes[j].0) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}
