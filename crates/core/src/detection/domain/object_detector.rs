use crate::shared::frame::Frame;

use super::class_vocabulary::ClassVocabulary;
use super::detection::Detection;

/// Domain interface for object detection.
///
/// Only objects whose label is in `classes` are returned. An empty result is
/// a valid answer, not an error. Implementations may keep state between
/// calls, hence `&mut self`.
pub trait ObjectDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        classes: &ClassVocabulary,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
