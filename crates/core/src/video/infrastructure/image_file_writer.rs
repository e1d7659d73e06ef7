use std::fs;
use std::path::Path;

use image::ImageFormat;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames as image files with the `image` crate, format chosen by
/// extension.
///
/// Each file is written under a `.partial` name and renamed into place, so
/// a frame listing never picks up a half-written image.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let format = ImageFormat::from_path(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let img = frame
            .to_rgb_image()
            .ok_or_else(|| format!("frame {} has a malformed pixel buffer", frame.index()))?;
        let partial = path.with_extension("partial");
        if let Err(e) = img.save_with_format(&partial, format) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        fs::rename(&partial, path)?;
        Ok(())
    }
}
