use crate::detection::domain::detection::Detection;
use crate::segmentation::domain::instance_segmenter::InstanceSegmenter;
use crate::segmentation::domain::mask::Mask;
use crate::shared::frame::Frame;

/// Segmenter that takes each detection's box as its mask.
#[derive(Default)]
pub struct BoxMaskSegmenter;

impl BoxMaskSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl InstanceSegmenter for BoxMaskSegmenter {
    fn segment(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
    ) -> Result<Vec<Mask>, Box<dyn std::error::Error>> {
        Ok(detections
            .iter()
            .map(|d| Mask::from_box(&d.bbox, frame.width(), frame.height()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bbox::BoundingBox;

    #[test]
    fn test_one_mask_per_detection_in_order() {
        let frame = Frame::filled(10, 10, [0; 3], 0);
        let dets = vec![
            Detection::new(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 0.9, 0, "person"),
            Detection::new(BoundingBox::new(5.0, 5.0, 10.0, 6.0), 0.8, 2, "car"),
        ];
        let masks = BoxMaskSegmenter::new().segment(&frame, &dets).unwrap();
        assert_eq!(masks.len(), 2);
        assert_eq!(masks[0].area(), 4);
        assert_eq!(masks[1].area(), 5);
        assert_eq!((masks[1].width(), masks[1].height()), (10, 10));
    }

    #[test]
    fn test_no_detections_no_masks() {
        let frame = Frame::filled(4, 4, [0; 3], 0);
        assert!(BoxMaskSegmenter::new().segment(&frame, &[]).unwrap().is_empty());
    }
}
