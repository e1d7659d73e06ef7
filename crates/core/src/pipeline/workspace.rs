use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::shared::constants::{
    BBOX_OUTPUT_DIR, BOUNDING_BOX_DIR, INFERENCE_FRAMES_DIR, INSTANCE_SEGMENTATION_DIR,
    SEGMENTED_FRAMES_DIR, SOURCE_FRAMES_DIR, WORKSPACE_DIRS,
};

use super::error::PipelineError;

/// The fixed set of intermediate directories under one root.
///
/// Directory names are not keyed by run, so one root serves one run at a
/// time.
#[derive(Clone, Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_frames_dir(&self) -> PathBuf {
        self.root.join(SOURCE_FRAMES_DIR)
    }

    pub fn output_frames_dir(&self) -> PathBuf {
        self.root.join(SEGMENTED_FRAMES_DIR)
    }

    pub fn bounding_box_dir(&self) -> PathBuf {
        self.root.join(BOUNDING_BOX_DIR)
    }

    pub fn bbox_output_dir(&self) -> PathBuf {
        self.root.join(BBOX_OUTPUT_DIR)
    }

    pub fn instance_segmentation_dir(&self) -> PathBuf {
        self.root.join(INSTANCE_SEGMENTATION_DIR)
    }

    pub fn inference_frames_dir(&self) -> PathBuf {
        self.root.join(INFERENCE_FRAMES_DIR)
    }

    /// Creates every directory empty. Leftovers from an earlier run that
    /// never reached cleanup are removed first.
    pub fn prepare(&self) -> Result<(), PipelineError> {
        self.purge()
    }

    /// Deletes and recreates every directory. A failure on one directory
    /// does not stop the others; the first error is returned.
    pub fn purge(&self) -> Result<(), PipelineError> {
        let mut first_err = None;
        for name in WORKSPACE_DIRS {
            let dir = self.root.join(name);
            if let Err(e) = reset_dir(&dir) {
                log::warn!("{e}");
                first_err.get_or_insert(e);
            } else {
                log::debug!("Reset {}", dir.display());
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

fn reset_dir(dir: &Path) -> Result<(), PipelineError> {
    let workspace_err = |source: std::io::Error| PipelineError::Workspace {
        path: dir.to_path_buf(),
        source,
    };
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(workspace_err(e)),
    }
    fs::create_dir_all(dir).map_err(workspace_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_empty_dir(path: &Path) -> bool {
        path.is_dir() && fs::read_dir(path).unwrap().next().is_none()
    }

    #[test]
    fn test_prepare_creates_all_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("ws"));
        ws.prepare().unwrap();
        for name in WORKSPACE_DIRS {
            assert!(is_empty_dir(&ws.root().join(name)), "{name}");
        }
    }

    #[test]
    fn test_purge_empties_existing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.prepare().unwrap();
        fs::write(ws.output_frames_dir().join("frame_000001.png"), b"x").unwrap();
        fs::create_dir_all(ws.bounding_box_dir().join("nested")).unwrap();

        ws.purge().unwrap();

        assert!(is_empty_dir(&ws.output_frames_dir()));
        assert!(is_empty_dir(&ws.bounding_box_dir()));
    }

    #[test]
    fn test_purge_leaves_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        fs::write(dir.path().join("keep.txt"), b"x").unwrap();
        ws.purge().unwrap();
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_purge_resets_later_dirs_after_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.prepare().unwrap();
        fs::remove_dir_all(ws.source_frames_dir()).unwrap();
        fs::write(ws.source_frames_dir(), b"not a dir").unwrap();
        fs::write(ws.inference_frames_dir().join("frame_000003.png"), b"x").unwrap();

        match ws.purge() {
            Err(PipelineError::Workspace { path, .. }) => assert_eq!(path, ws.source_frames_dir()),
            other => panic!("expected workspace error, got {other:?}"),
        }
        assert!(is_empty_dir(&ws.inference_frames_dir()));
        assert!(is_empty_dir(&ws.output_frames_dir()));
    }

    #[test]
    fn test_purge_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("file");
        fs::write(&root, b"x").unwrap();
        assert!(matches!(
            Workspace::new(root).purge(),
            Err(PipelineError::Workspace { .. })
        ));
    }
}
