use serde::{Deserialize, Serialize};

use crate::shared::bbox::BoundingBox;

/// One object found in a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
    pub class_id: usize,
    pub label: String,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f64, class_id: usize, label: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
            label: label.into(),
        }
    }
}
