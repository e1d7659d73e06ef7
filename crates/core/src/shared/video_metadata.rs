use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Output geometry for a run: source resolution multiplied by `factor`.
    ///
    /// Sizes are rounded to the nearest even value and never drop below 2,
    /// since YUV 4:2:0 encoders reject odd dimensions.
    pub fn scaled(&self, factor: f64) -> VideoMetadata {
        VideoMetadata {
            width: scale_dimension(self.width, factor),
            height: scale_dimension(self.height, factor),
            ..self.clone()
        }
    }
}

fn scale_dimension(value: u32, factor: f64) -> u32 {
    let scaled = (value as f64 * factor).round().max(2.0) as u32;
    scaled - scaled % 2
}
