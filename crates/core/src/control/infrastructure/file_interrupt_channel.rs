use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::control::domain::interrupt_channel::InterruptChannel;
use crate::control::domain::interrupt_signal::InterruptSignal;
use crate::shared::constants::INTERRUPT_FILE_PREFIX;

/// Interrupt channel backed by `<dir>/interrupt_<run_id>.txt`.
///
/// The job only reads the file and writes the final `Ended`; observers
/// write signals with [`FileInterruptChannel::send`].
pub struct FileInterruptChannel {
    path: PathBuf,
}

impl FileInterruptChannel {
    pub fn new(dir: &Path, run_id: &str) -> Self {
        Self {
            path: dir.join(format!("{INTERRUPT_FILE_PREFIX}{run_id}.txt")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn send(&self, signal: InterruptSignal) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{signal}\n"))?;
        Ok(())
    }
}

impl InterruptChannel for FileInterruptChannel {
    fn read(&self) -> Result<InterruptSignal, Box<dyn std::error::Error>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(InterruptSignal::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(InterruptSignal::None),
            Err(e) => Err(e.into()),
        }
    }

    fn mark_ended(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.send(InterruptSignal::Ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileInterruptChannel::new(dir.path(), "abc");
        assert_eq!(channel.read().unwrap(), InterruptSignal::None);
    }

    #[test]
    fn test_path_is_keyed_by_run_id() {
        let channel = FileInterruptChannel::new(Path::new("/tmp/int"), "job-7");
        assert_eq!(channel.path(), Path::new("/tmp/int/interrupt_job-7.txt"));
    }

    #[test]
    fn test_send_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileInterruptChannel::new(&dir.path().join("nested"), "abc");
        channel.send(InterruptSignal::DisableDetection).unwrap();
        assert_eq!(channel.read().unwrap(), InterruptSignal::DisableDetection);
        channel.send(InterruptSignal::StopProcessing).unwrap();
        assert_eq!(channel.read().unwrap(), InterruptSignal::StopProcessing);
    }

    #[test]
    fn test_externally_written_text_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileInterruptChannel::new(dir.path(), "abc");
        fs::write(channel.path(), "  STOPPROCESS\r\n").unwrap();
        assert_eq!(channel.read().unwrap(), InterruptSignal::StopProcessing);
        fs::write(channel.path(), "").unwrap();
        assert_eq!(channel.read().unwrap(), InterruptSignal::None);
    }

    #[test]
    fn test_mark_ended_writes_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut channel = FileInterruptChannel::new(dir.path(), "abc");
        channel.send(InterruptSignal::StopProcessing).unwrap();
        channel.mark_ended().unwrap();
        assert_eq!(fs::read_to_string(channel.path()).unwrap(), "Ended\n");
    }

    #[test]
    fn test_unreadable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let channel = FileInterruptChannel::new(dir.path(), "abc");
        fs::create_dir_all(channel.path()).unwrap();
        assert!(channel.read().is_err());
    }
}
