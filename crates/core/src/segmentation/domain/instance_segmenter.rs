use crate::detection::domain::detection::Detection;
use crate::segmentation::domain::mask::Mask;
use crate::shared::frame::Frame;

/// Produces one instance mask per detection, in detection order.
pub trait InstanceSegmenter: Send {
    fn segment(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
    ) -> Result<Vec<Mask>, Box<dyn std::error::Error>>;
}
