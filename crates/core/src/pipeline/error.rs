use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("cannot read source {path}: {message}")]
    SourceRead { path: PathBuf, message: String },
    #[error("reassembly failed: {0}")]
    Reassembly(String),
    #[error("workspace error at {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("interrupt channel error: {0}")]
    Signal(String),
}

/// Adapter step a [`FrameError::Adapter`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdapterStage {
    Detect,
    Segment,
    Propagate,
    Render,
    /// Writing an intermediate image into the workspace.
    Write,
}

impl AdapterStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Segment => "segment",
            Self::Propagate => "propagate",
            Self::Render => "render",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for AdapterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame failures. The frame falls back to its raw pixels and the run
/// goes on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("{stage} failed: {message}")]
    Adapter {
        stage: AdapterStage,
        message: String,
    },
    #[error("no detections")]
    NoDetections,
}

impl FrameError {
    pub fn adapter(stage: AdapterStage, err: impl fmt::Display) -> Self {
        Self::Adapter {
            stage,
            message: err.to_string(),
        }
    }
}
