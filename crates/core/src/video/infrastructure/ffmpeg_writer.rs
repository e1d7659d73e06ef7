use std::path::Path;

use ffmpeg_next::Rational;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Used when the source reports no usable framerate.
const FALLBACK_FPS: i32 = 30;

/// Encodes RGB frames into an MPEG-4 video via ffmpeg-next.
///
/// Frames whose size differs from the geometry given to `open` are resized
/// before encoding, so a run can scale its output without touching the
/// per-frame images.
pub struct FfmpegWriter {
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    rate: Rational,
    frame_count: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            rate: Rational(FALLBACK_FPS, 1),
            frame_count: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frame_count
    }

    fn drain_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };
        let ost_time_base = octx
            .stream(0)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.rate.invert(), ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Source rate as a fraction with millisecond-per-second precision, so
/// 29.97 stays 2997/100 instead of becoming 30.
fn encoder_rate(fps: f64) -> Rational {
    let millis = (fps * 1000.0).round();
    if !millis.is_finite() || millis < 1.0 || millis > i32::MAX as f64 {
        return Rational(FALLBACK_FPS, 1);
    }
    Rational(millis as i32, 1000).reduce()
}

/// Returns `frame` at `width` × `height`, resizing only when needed.
fn fit_frame(frame: &Frame, width: u32, height: u32) -> Result<Frame, Box<dyn std::error::Error>> {
    if frame.width() == width && frame.height() == height {
        return Ok(frame.clone());
    }
    let img = frame
        .to_rgb_image()
        .ok_or("Failed to create image from frame data")?;
    let resized =
        image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
    Ok(Frame::from_rgb_image(resized, frame.index()))
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        self.width = metadata.width;
        self.height = metadata.height;
        self.rate = encoder_rate(metadata.fps);

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        // MPEG4 ships with every ffmpeg build
        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(self.rate.invert());
        encoder_ctx.set_frame_rate(Some(self.rate));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(scaler)) = (self.encoder.as_mut(), self.scaler.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };
        let frame = fit_frame(frame, self.width, self.height)?;

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let stride = rgb_frame.stride(0);
        let row_bytes = self.width as usize * 3;
        let data = rgb_frame.data_mut(0);
        let src = frame.data();

        for row in 0..self.height as usize {
            let src_start = row * row_bytes;
            let dst_start = row * stride;
            data[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src[src_start..src_start + row_bytes]);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        encoder.send_frame(&yuv_frame)?;
        self.drain_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
            self.drain_packets()?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer()?;
            }
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

    fn metadata(w: u32, h: u32, fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: w,
            height: h,
            fps,
            total_frames: 0,
            codec: String::new(),
            source_path: None,
        }
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        for i in 0..3 {
            writer.write(&Frame::filled(160, 120, [128; 3], i)).unwrap();
        }
        writer.close().unwrap();

        assert_eq!(writer.frames_written(), 3);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_without_open_returns_error() {
        let mut writer = FfmpegWriter::new();
        assert!(writer.write(&Frame::filled(16, 16, [0; 3], 0)).is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(160, 120, 30.0)).unwrap();
        writer.write(&Frame::filled(160, 120, [128; 3], 0)).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_mismatched_frames_are_resized_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaled.mp4");

        let mut writer = FfmpegWriter::new();
        writer.open(&path, &metadata(80, 60, 24.0)).unwrap();
        for i in 0..2 {
            writer.write(&Frame::filled(160, 120, [90; 3], i)).unwrap();
        }
        writer.close().unwrap();

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (80, 60));
        assert_eq!(reader.frames().count(), 2);
    }

    #[test]
    fn test_encoder_rate_keeps_fractional_fps() {
        let rate = |fps: f64| {
            let r = encoder_rate(fps);
            (r.numerator(), r.denominator())
        };
        assert_eq!(rate(29.97), (2997, 100));
        assert_eq!(rate(12.0), (12, 1));
        assert_eq!(rate(0.0), (FALLBACK_FPS, 1));
        assert_eq!(rate(f64::NAN), (FALLBACK_FPS, 1));
    }
}
