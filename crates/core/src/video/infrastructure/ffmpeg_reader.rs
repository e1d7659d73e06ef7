use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as AvFrame;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Decodes the best video stream of a container to RGB [`Frame`]s.
pub struct FfmpegReader {
    input: Option<Input>,
    stream_index: usize,
}

// Safety: a reader is owned by one frame store and driven from one thread.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input: None,
            stream_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Nominal rate, else average rate, else 0.
fn stream_fps(stream: &ffmpeg_next::format::stream::Stream) -> f64 {
    [stream.rate(), stream.avg_frame_rate()]
        .into_iter()
        .find(|r| r.numerator() > 0 && r.denominator() > 0)
        .map_or(0.0, |r| r.numerator() as f64 / r.denominator() as f64)
}

fn open_decoder(
    stream: &ffmpeg_next::format::stream::Stream,
) -> Result<ffmpeg_next::decoder::Video, ffmpeg_next::Error> {
    ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
        .decoder()
        .video()
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let input = ffmpeg_next::format::input(path)?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("{} has no video stream", path.display()))?;
        let decoder = open_decoder(&stream)?;

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps: stream_fps(&stream),
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {}: {}x{} {} @ {:.3} fps, ~{} frames",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.codec,
            metadata.fps,
            metadata.total_frames
        );

        self.stream_index = stream.index();
        self.input = Some(input);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let stream_index = self.stream_index;
        let Some(input) = self.input.as_mut() else {
            return Box::new(std::iter::once(Err("reader is not open".into())));
        };
        match Frames::new(input, stream_index) {
            Ok(frames) => Box::new(frames),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input = None;
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Reading,
    Draining,
    Finished,
}

/// Decodes one frame per `next()`, pulling packets as needed.
struct Frames<'a> {
    input: &'a mut Input,
    stream_index: usize,
    decoder: ffmpeg_next::decoder::Video,
    to_rgb: scaling::Context,
    width: u32,
    height: u32,
    next_index: usize,
    rejected_packets: usize,
    state: DecodeState,
}

impl<'a> Frames<'a> {
    fn new(input: &'a mut Input, stream_index: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = input
            .stream(stream_index)
            .ok_or("video stream no longer present")?;
        let decoder = open_decoder(&stream)?;
        let (width, height) = (decoder.width(), decoder.height());
        let to_rgb = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            input,
            stream_index,
            decoder,
            to_rgb,
            width,
            height,
            next_index: 0,
            rejected_packets: 0,
            state: DecodeState::Reading,
        })
    }

    fn receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = AvFrame::empty();
        self.decoder.receive_frame(&mut decoded).ok()?;

        let mut rgb = AvFrame::empty();
        if let Err(e) = self.to_rgb.run(&decoded, &mut rgb) {
            return Some(Err(e.into()));
        }
        let frame = Frame::new(
            packed_rgb(&rgb, self.width, self.height),
            self.width,
            self.height,
            self.next_index,
        );
        self.next_index += 1;
        Some(Ok(frame))
    }

    fn finish(&mut self) {
        self.state = DecodeState::Finished;
        if self.rejected_packets > 0 {
            log::warn!(
                "Decoder rejected {} packets; {} frames decoded",
                self.rejected_packets,
                self.next_index
            );
        }
    }
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                DecodeState::Finished => return None,
                DecodeState::Draining => {
                    let frame = self.receive();
                    if frame.is_none() {
                        self.finish();
                    }
                    return frame;
                }
                DecodeState::Reading => {
                    if let Some(frame) = self.receive() {
                        return Some(frame);
                    }
                    match self.input.packets().next() {
                        Some((stream, packet)) => {
                            if stream.index() == self.stream_index
                                && self.decoder.send_packet(&packet).is_err()
                            {
                                self.rejected_packets += 1;
                            }
                        }
                        None => {
                            if let Err(e) = self.decoder.send_eof() {
                                log::debug!("Sending EOF to decoder: {e}");
                            }
                            self.state = DecodeState::Draining;
                        }
                    }
                }
            }
        }
    }
}

/// RGB24 pixels without the row padding ffmpeg may add.
fn packed_rgb(frame: &AvFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_bytes = width as usize * 3;
    frame
        .data(0)
        .chunks(stride)
        .take(height as usize)
        .flat_map(|row| &row[..row_bytes])
        .copied()
        .collect()
}
