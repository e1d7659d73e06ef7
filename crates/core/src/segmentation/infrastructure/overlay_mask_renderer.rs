use crate::segmentation::domain::mask_propagator::Propagation;
use crate::segmentation::domain::mask_renderer::MaskRenderer;
use crate::shared::frame::Frame;

pub const DEFAULT_MASK_OPACITY: f64 = 0.5;

const PALETTE: [[u8; 3]; 8] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
];

/// Color assigned to an object id. Stable for the lifetime of the id.
pub fn object_color(object_id: u32) -> [u8; 3] {
    PALETTE[(object_id as usize) % PALETTE.len()]
}

/// Blends each object's color over its mask and outlines the mask bounds.
pub struct OverlayMaskRenderer {
    opacity: f64,
}

impl OverlayMaskRenderer {
    pub fn new(opacity: f64) -> Self {
        Self {
            opacity: opacity.clamp(0.0, 1.0),
        }
    }
}

impl Default for OverlayMaskRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_OPACITY)
    }
}

impl MaskRenderer for OverlayMaskRenderer {
    fn render(
        &self,
        frame: &Frame,
        propagation: &Propagation,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        if propagation.object_ids.len() != propagation.masks.len() {
            return Err(format!(
                "{} object ids for {} masks",
                propagation.object_ids.len(),
                propagation.masks.len()
            )
            .into());
        }

        let mut out = frame.clone();
        for (id, mask) in propagation.object_ids.iter().zip(&propagation.masks) {
            mask.ensure_size(frame.width(), frame.height())?;
            let color = object_color(*id);
            for y in 0..mask.height() {
                for x in 0..mask.width() {
                    if mask.contains(x, y) {
                        out.blend_pixel(x, y, color, self.opacity);
                    }
                }
            }
            if let Some(span) = mask.bounds() {
                out.outline(span, color);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::domain::mask::Mask;
    use crate::segmentation::domain::mask_propagator::PropagationState;
    use crate::shared::bbox::BoundingBox;

    fn propagation(ids: Vec<u32>, masks: Vec<Mask>) -> Propagation {
        Propagation {
            object_ids: ids,
            masks,
            state: PropagationState::default(),
        }
    }

    #[test]
    fn test_empty_propagation_leaves_frame_unchanged() {
        let frame = Frame::filled(6, 6, [10, 20, 30], 2);
        let out = OverlayMaskRenderer::default()
            .render(&frame, &propagation(vec![], vec![]))
            .unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_blends_inside_mask_only() {
        let frame = Frame::filled(8, 8, [0; 3], 0);
        let mask = Mask::from_box(&BoundingBox::new(1.0, 1.0, 6.0, 6.0), 8, 8);
        let out = OverlayMaskRenderer::new(1.0)
            .render(&frame, &propagation(vec![3], vec![mask]))
            .unwrap();
        assert_eq!(out.pixel(3, 3), object_color(3));
        assert_eq!(out.pixel(1, 1), object_color(3));
        assert_eq!(out.pixel(7, 7), [0; 3]);
    }

    #[test]
    fn test_partial_opacity() {
        let frame = Frame::filled(4, 4, [0; 3], 0);
        let mask = Mask::from_box(&BoundingBox::new(0.0, 0.0, 4.0, 4.0), 4, 4);
        let out = OverlayMaskRenderer::new(0.5)
            .render(&frame, &propagation(vec![0], vec![mask]))
            .unwrap();
        // interior pixel, untouched by the outline
        assert_eq!(out.pixel(1, 1), [115, 13, 38]);
    }

    #[test]
    fn test_mismatched_lengths_are_error() {
        let frame = Frame::filled(4, 4, [0; 3], 0);
        assert!(OverlayMaskRenderer::default()
            .render(&frame, &propagation(vec![1], vec![]))
            .is_err());
    }

    #[test]
    fn test_mask_size_mismatch_is_error() {
        let frame = Frame::filled(4, 4, [0; 3], 0);
        assert!(OverlayMaskRenderer::default()
            .render(&frame, &propagation(vec![1], vec![Mask::empty(2, 2)]))
            .is_err());
    }

    #[test]
    fn test_colors_are_stable() {
        assert_eq!(object_color(1), object_color(9));
        assert_ne!(object_color(1), object_color(2));
    }
}
