use thiserror::Error;

use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

/// Logit written for pixels inside a hard-edged mask.
pub const FOREGROUND_LOGIT: f32 = 10.0;
/// Logit written for pixels outside a hard-edged mask.
pub const BACKGROUND_LOGIT: f32 = -10.0;

/// Per-pixel mask logits for one object, row-major. A pixel belongs to the
/// object when its logit is positive.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    width: u32,
    height: u32,
    logits: Vec<f32>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mask is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
pub struct MaskSizeMismatch {
    pub expected_w: u32,
    pub expected_h: u32,
    pub actual_w: u32,
    pub actual_h: u32,
}

impl Mask {
    pub fn new(width: u32, height: u32, logits: Vec<f32>) -> Self {
        debug_assert_eq!(
            logits.len(),
            (width as usize) * (height as usize),
            "logits length must equal width * height"
        );
        Self {
            width,
            height,
            logits,
        }
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self::new(
            width,
            height,
            vec![BACKGROUND_LOGIT; (width as usize) * (height as usize)],
        )
    }

    /// Hard mask covering the pixels under `bbox`, clipped to the frame.
    pub fn from_box(bbox: &BoundingBox, width: u32, height: u32) -> Self {
        let mut mask = Self::empty(width, height);
        let (x0, y0, x1, y1) = bbox.pixel_span(width, height);
        for y in y0..y1 {
            let row = (y as usize) * (width as usize);
            for x in x0..x1 {
                mask.logits[row + x as usize] = FOREGROUND_LOGIT;
            }
        }
        mask
    }

    /// Pixel-wise maximum over `masks`. Every mask must be `width` × `height`.
    pub fn union(width: u32, height: u32, masks: &[Mask]) -> Result<Self, MaskSizeMismatch> {
        let mut out = Self::empty(width, height);
        for mask in masks {
            mask.ensure_size(width, height)?;
            for (acc, v) in out.logits.iter_mut().zip(&mask.logits) {
                *acc = acc.max(*v);
            }
        }
        Ok(out)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn logits(&self) -> &[f32] {
        &self.logits
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.logits[(y as usize) * (self.width as usize) + x as usize] > 0.0
    }

    /// Number of foreground pixels.
    pub fn area(&self) -> usize {
        self.logits.iter().filter(|&&v| v > 0.0).count()
    }

    /// Tight end-exclusive pixel span `(x0, y0, x1, y1)` of the foreground,
    /// or `None` when the mask is empty.
    pub fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut span: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.contains(x, y) {
                    continue;
                }
                span = Some(match span {
                    None => (x, y, x + 1, y + 1),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
                });
            }
        }
        span
    }

    pub fn ensure_size(&self, width: u32, height: u32) -> Result<(), MaskSizeMismatch> {
        if self.width == width && self.height == height {
            return Ok(());
        }
        Err(MaskSizeMismatch {
            expected_w: width,
            expected_h: height,
            actual_w: self.width,
            actual_h: self.height,
        })
    }

    /// Black and white image of the mask, white where the object is.
    pub fn to_frame(&self, index: usize) -> Frame {
        let mut frame = Frame::filled(self.width, self.height, [0; 3], index);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.contains(x, y) {
                    frame.set_pixel(x, y, [255; 3]);
                }
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_box_covers_span() {
        let mask = Mask::from_box(&BoundingBox::new(1.0, 1.0, 3.0, 2.0), 4, 4);
        assert_eq!(mask.area(), 2);
        assert!(mask.contains(1, 1));
        assert!(mask.contains(2, 1));
        assert!(!mask.contains(3, 1));
        assert!(!mask.contains(1, 2));
    }

    #[test]
    fn test_from_box_clips_outside_frame() {
        let mask = Mask::from_box(&BoundingBox::new(-5.0, -5.0, 2.0, 2.0), 4, 4);
        assert_eq!(mask.area(), 4);
        let off = Mask::from_box(&BoundingBox::new(10.0, 10.0, 20.0, 20.0), 4, 4);
        assert_eq!(off.area(), 0);
    }

    #[test]
    fn test_union_takes_max() {
        let a = Mask::from_box(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 3, 3);
        let b = Mask::from_box(&BoundingBox::new(2.0, 2.0, 3.0, 3.0), 3, 3);
        let u = Mask::union(3, 3, &[a, b]).unwrap();
        assert_eq!(u.area(), 2);
        assert!(u.contains(0, 0));
        assert!(u.contains(2, 2));
    }

    #[test]
    fn test_union_of_nothing_is_empty() {
        assert_eq!(Mask::union(2, 2, &[]).unwrap().area(), 0);
    }

    #[test]
    fn test_union_rejects_size_mismatch() {
        let err = Mask::union(4, 4, &[Mask::empty(2, 2)]).unwrap_err();
        assert_eq!(err.actual_w, 2);
        assert_eq!(err.to_string(), "mask is 2x2, expected 4x4");
    }

    #[test]
    fn test_bounds() {
        assert_eq!(Mask::empty(3, 3).bounds(), None);
        let mask = Mask::from_box(&BoundingBox::new(1.0, 0.0, 3.0, 2.0), 4, 4);
        assert_eq!(mask.bounds(), Some((1, 0, 3, 2)));
    }

    #[test]
    fn test_to_frame_is_binary() {
        let mask = Mask::from_box(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 2, 1);
        let frame = mask.to_frame(4);
        assert_eq!(frame.index(), 4);
        assert_eq!(frame.pixel(0, 0), [255; 3]);
        assert_eq!(frame.pixel(1, 0), [0; 3]);
    }
}
