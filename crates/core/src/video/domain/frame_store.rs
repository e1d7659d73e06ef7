use std::path::{Path, PathBuf};

use crate::shared::constants::{FRAME_EXTENSION, FRAME_EXTENSIONS, FRAME_INDEX_WIDTH, FRAME_PREFIX};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Addresses the raw frames of a run and the per-frame outputs written back.
///
/// Raw frames live in a source directory filled by `extract`; outputs live in
/// a separate directory, one image per enumerated index.
pub trait FrameStore: Send {
    /// Decodes `source` into the raw frame directory.
    ///
    /// The returned metadata carries the source framerate and resolution, with
    /// `total_frames` set to the number of frames actually written.
    fn extract(&mut self, source: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Raw frame paths in capture order (see [`sort_frame_paths`]).
    fn list(&self) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>;

    /// Loads the image at `path`, tagging it with `index`.
    fn read(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Writes `frame` as the output for `frame.index()`.
    fn write_output(&mut self, frame: &Frame) -> Result<PathBuf, Box<dyn std::error::Error>>;

    /// Output frame paths in index order.
    fn outputs(&self) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>;
}

/// File name for the frame at `index`, zero-padded so that a plain
/// lexicographic listing agrees with numeric order.
pub fn frame_file_name(index: usize) -> String {
    format!("{FRAME_PREFIX}{index:0width$}.{FRAME_EXTENSION}", width = FRAME_INDEX_WIDTH)
}

pub fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Ordering key for frame files: the trailing integer of the file stem.
///
/// `frame_2.png` sorts before `frame_10.png` even without zero padding.
/// Files without a numeric suffix sort after all numbered ones, by name.
pub fn frame_sort_key(path: &Path) -> (bool, u64, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    match digits.parse::<u64>() {
        Ok(n) => (false, n, name),
        Err(_) => (true, 0, name),
    }
}

pub fn sort_frame_paths(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| frame_sort_key(p));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/frames").join(n)).collect()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_frame_file_name_is_zero_padded() {
        assert_eq!(frame_file_name(0), "frame_000000.png");
        assert_eq!(frame_file_name(42), "frame_000042.png");
    }

    #[test]
    fn test_unpadded_names_sort_numerically() {
        let mut p = paths(&["frame_10.jpg", "frame_2.jpg", "frame_1.jpg", "frame_100.jpg"]);
        sort_frame_paths(&mut p);
        assert_eq!(
            names(&p),
            vec!["frame_1.jpg", "frame_2.jpg", "frame_10.jpg", "frame_100.jpg"]
        );
    }

    #[test]
    fn test_padded_and_unpadded_agree() {
        let mut p = paths(&["frame_000010.png", "frame_9.png"]);
        sort_frame_paths(&mut p);
        assert_eq!(names(&p), vec!["frame_9.png", "frame_000010.png"]);
    }

    #[test]
    fn test_unnumbered_files_sort_last() {
        let mut p = paths(&["cover.png", "frame_3.png", "alpha.png", "frame_1.png"]);
        sort_frame_paths(&mut p);
        assert_eq!(
            names(&p),
            vec!["frame_1.png", "frame_3.png", "alpha.png", "cover.png"]
        );
    }

    #[test]
    fn test_is_frame_file_case_insensitive() {
        assert!(is_frame_file(Path::new("a/frame_1.PNG")));
        assert!(is_frame_file(Path::new("a/frame_1.jpeg")));
        assert!(!is_frame_file(Path::new("a/notes.txt")));
        assert!(!is_frame_file(Path::new("a/frame")));
    }
}
