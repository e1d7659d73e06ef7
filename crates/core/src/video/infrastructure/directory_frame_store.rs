use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_store::{frame_file_name, is_frame_file, sort_frame_paths, FrameStore};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Frame store backed by two directories of image files.
///
/// Extraction decodes through a [`VideoReader`] and writes every frame as
/// `frame_<index>.png` into `source_dir`. Outputs go to `output_dir` under
/// the same naming scheme.
pub struct DirectoryFrameStore {
    source_dir: PathBuf,
    output_dir: PathBuf,
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
}

impl DirectoryFrameStore {
    pub fn new(
        source_dir: PathBuf,
        output_dir: PathBuf,
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
    ) -> Self {
        Self {
            source_dir,
            output_dir,
            reader,
            image_writer,
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_frame_file(&path) {
            paths.push(path);
        }
    }
    sort_frame_paths(&mut paths);
    Ok(paths)
}

impl FrameStore for DirectoryFrameStore {
    fn extract(&mut self, source: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        fs::create_dir_all(&self.source_dir)?;
        let mut metadata = self.reader.open(source)?;

        let mut written = 0usize;
        let mut failure: Option<Box<dyn std::error::Error>> = None;
        for frame_result in self.reader.frames() {
            let frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            let path = self.source_dir.join(frame_file_name(frame.index()));
            if let Err(e) = self.image_writer.write(&path, &frame) {
                failure = Some(e);
                break;
            }
            written += 1;
        }
        self.reader.close();

        if let Some(e) = failure {
            return Err(e);
        }
        if written == 0 {
            return Err(format!("No frames decoded from {}", source.display()).into());
        }

        log::debug!(
            "Extracted {written} frames ({} reported by container)",
            metadata.total_frames
        );
        metadata.total_frames = written;
        Ok(metadata)
    }

    fn list(&self) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        list_frames(&self.source_dir)
    }

    fn read(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)?.to_rgb8();
        Ok(Frame::from_rgb_image(img, index))
    }

    fn write_output(&mut self, frame: &Frame) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.output_dir.join(frame_file_name(frame.index()));
        self.image_writer.write(&path, frame)?;
        Ok(path)
    }

    fn outputs(&self) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        list_frames(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
    use crate::video::infrastructure::image_file_writer::ImageFileWriter;
    use crate::video::infrastructure::test_video::create_test_video;

    fn store(root: &Path) -> DirectoryFrameStore {
        DirectoryFrameStore::new(
            root.join("data"),
            root.join("segmented_frames"),
            Box::new(FfmpegReader::new()),
            Box::new(ImageFileWriter::new()),
        )
    }

    #[test]
    fn test_extract_writes_one_file_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("in.mp4");
        create_test_video(&video, 4, 64, 48, 25.0);

        let mut store = store(dir.path());
        let meta = store.extract(&video).unwrap();

        assert_eq!(meta.total_frames, 4);
        assert_eq!((meta.width, meta.height), (64, 48));
        assert!(meta.fps > 0.0);

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 4);
        assert!(listed[0].ends_with("frame_000000.png"));
        assert!(listed[3].ends_with("frame_000003.png"));
    }

    #[test]
    fn test_extract_unreadable_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());
        assert!(store.extract(Path::new("/nonexistent/in.mp4")).is_err());
    }

    #[test]
    fn test_list_orders_unpadded_names_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::create_dir_all(store.source_dir()).unwrap();
        let writer = ImageFileWriter::new();
        for i in [10usize, 2, 1] {
            let path = store.source_dir().join(format!("frame_{i}.png"));
            writer.write(&path, &Frame::filled(2, 2, [0; 3], i)).unwrap();
        }
        fs::write(store.source_dir().join("notes.txt"), "skip me").unwrap();

        let listed: Vec<String> = store
            .list()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(listed, vec!["frame_1.png", "frame_2.png", "frame_10.png"]);
    }

    #[test]
    fn test_output_roundtrip_is_pixel_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());
        let mut frame = Frame::filled(6, 4, [17, 34, 51], 3);
        frame.data_mut()[5] = 200;

        let path = store.write_output(&frame).unwrap();
        assert!(path.ends_with("frame_000003.png"));

        let read_back = store.read(&path, 3).unwrap();
        assert_eq!(read_back, frame);
        assert_eq!(store.outputs().unwrap(), vec![path]);
    }

    #[test]
    fn test_list_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir.path().join("absent")).list().is_err());
    }
}
