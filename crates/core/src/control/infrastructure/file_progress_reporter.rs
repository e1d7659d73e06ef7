use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::control::domain::progress_reporter::ProgressReporter;
use crate::shared::constants::PROGRESS_FILE_PREFIX;

/// Writes progress to `<dir>/progress_<run_id>.txt` as an integer and a
/// newline.
pub struct FileProgressReporter {
    path: PathBuf,
}

impl FileProgressReporter {
    pub fn new(dir: &Path, run_id: &str) -> Self {
        Self {
            path: progress_path(dir, run_id),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Observer side: last value written for `run_id`, or `None` when the
    /// run has not reported yet.
    pub fn read(dir: &Path, run_id: &str) -> Result<Option<u8>, Box<dyn std::error::Error>> {
        let text = match fs::read_to_string(progress_path(dir, run_id)) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(trimmed.parse::<u8>()?))
    }
}

fn progress_path(dir: &Path, run_id: &str) -> PathBuf {
    dir.join(format!("{PROGRESS_FILE_PREFIX}{run_id}.txt"))
}

impl ProgressReporter for FileProgressReporter {
    fn report(&mut self, percent: u8) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{percent}\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = FileProgressReporter::new(dir.path(), "r1");
        reporter.report(12).unwrap();
        reporter.report(40).unwrap();
        assert_eq!(fs::read_to_string(reporter.path()).unwrap(), "40\n");
        assert_eq!(FileProgressReporter::read(dir.path(), "r1").unwrap(), Some(40));
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(FileProgressReporter::read(dir.path(), "nope").unwrap(), None);
    }

    #[test]
    fn test_read_garbage_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("progress_r1.txt"), "half").unwrap();
        assert!(FileProgressReporter::read(dir.path(), "r1").is_err());
    }

    #[test]
    fn test_report_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let progress_dir = dir.path().join("progress");
        FileProgressReporter::new(&progress_dir, "r1").report(0).unwrap();
        assert!(progress_dir.join("progress_r1.txt").exists());
    }
}
