use ndarray::ArrayView3;

/// One video frame: tightly packed RGB bytes in row-major order, tagged with
/// its position in the run's enumeration.
///
/// Pixel format conversion happens at I/O boundaries only. Inside the
/// pipeline the payload is opaque, which is what lets a pass-through write
/// reproduce the extracted frame byte for byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

pub const RGB_CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * RGB_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// Builds a frame filled with a single color. Mostly useful for tests
    /// and placeholder output.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * RGB_CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self::new(data, width, height, index)
    }

    pub fn from_rgb_image(image: image::RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, index)
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the same pixels re-tagged with a new enumeration index.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y as usize) * (self.width as usize) + x as usize) * RGB_CHANNELS;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, RGB_CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let offset = ((y as usize) * (self.width as usize) + x as usize) * RGB_CHANNELS;
        self.data[offset..offset + RGB_CHANNELS].copy_from_slice(&rgb);
    }

    /// Mixes `rgb` into the pixel at `x, y` with weight `alpha` in [0, 1].
    pub fn blend_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3], alpha: f64) {
        let current = self.pixel(x, y);
        let mut mixed = [0u8; 3];
        for c in 0..RGB_CHANNELS {
            let v = current[c] as f64 * (1.0 - alpha) + rgb[c] as f64 * alpha;
            mixed[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        self.set_pixel(x, y, mixed);
    }

    /// Draws a one-pixel rectangle outline over the end-exclusive span
    /// `(x0, y0, x1, y1)`. Parts outside the frame are skipped.
    pub fn outline(&mut self, span: (u32, u32, u32, u32), rgb: [u8; 3]) {
        let (x0, y0, x1, y1) = span;
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for x in x0..x1 {
            self.set_pixel(x, y0, rgb);
            self.set_pixel(x, y1 - 1, rgb);
        }
        for y in y0..y1 {
            self.set_pixel(x0, y, rgb);
            self.set_pixel(x1 - 1, y, rgb);
        }
    }

    /// True when both frames carry identical pixels, regardless of index.
    pub fn same_pixels(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12];
        let frame = Frame::new(data.clone(), 2, 2, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_filled_sets_every_pixel() {
        let frame = Frame::filled(3, 2, [10, 20, 30], 0);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(frame.pixel(x, y), [10, 20, 30]);
            }
        }
    }

    #[test]
    fn test_rgb_image_conversion_keeps_pixels() {
        let mut img = image::RgbImage::new(4, 3);
        img.put_pixel(2, 1, image::Rgb([1, 2, 3]));
        let frame = Frame::from_rgb_image(img.clone(), 7);
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.pixel(2, 1), [1, 2, 3]);
        assert_eq!(frame.to_rgb_image().unwrap(), img);
    }

    #[test]
    fn test_with_index_keeps_pixels() {
        let frame = Frame::filled(2, 2, [9, 9, 9], 0);
        let moved = frame.clone().with_index(4);
        assert_eq!(moved.index(), 4);
        assert!(moved.same_pixels(&frame));
        assert_ne!(moved, frame);
    }

    #[test]
    fn test_as_ndarray_shape_and_access() {
        let mut data = vec![0u8; 24];
        data[RGB_CHANNELS * 4] = 255; // row=1, col=0, R
        let frame = Frame::new(data, 4, 2, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_blend_pixel_mixes_by_alpha() {
        let mut frame = Frame::filled(1, 1, [0, 100, 200], 0);
        frame.blend_pixel(0, 0, [200, 100, 0], 0.5);
        assert_eq!(frame.pixel(0, 0), [100, 100, 100]);
    }

    #[test]
    fn test_outline_draws_border_only() {
        let mut frame = Frame::filled(5, 5, [0; 3], 0);
        frame.outline((1, 1, 4, 4), [255, 0, 0]);
        assert_eq!(frame.pixel(1, 1), [255, 0, 0]);
        assert_eq!(frame.pixel(3, 3), [255, 0, 0]);
        assert_eq!(frame.pixel(2, 2), [0, 0, 0]);
        assert_eq!(frame.pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_outline_clips_to_frame() {
        let mut frame = Frame::filled(3, 3, [0; 3], 0);
        frame.outline((1, 1, 10, 10), [9, 9, 9]);
        assert_eq!(frame.pixel(2, 2), [9, 9, 9]);
        frame.outline((3, 3, 5, 5), [1, 1, 1]);
    }

    #[test]
    fn test_same_pixels_detects_difference() {
        let a = Frame::filled(2, 2, [0, 0, 0], 0);
        let mut b = a.clone();
        b.data_mut()[0] = 1;
        assert!(!a.same_pixels(&b));
    }
}
