use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use crate::segmentation::infrastructure::overlay_mask_renderer::DEFAULT_MASK_OPACITY;
use crate::shared::constants::TRACKER_MAX_LOST;

const APP_DIR: &str = "maskreel";
const SETTINGS_FILE: &str = "settings.json";
const MAX_SCALE_FACTOR: f64 = 4.0;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Everything about a run that is not part of the request itself.
///
/// Missing fields in a settings file take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Root of the intermediate directories. Purged at the end of every run.
    pub workspace_root: PathBuf,
    pub interrupt_dir: PathBuf,
    pub progress_dir: PathBuf,
    /// Output resolution relative to the source, in (0, 4].
    pub scale_factor: f64,
    pub confidence: f64,
    pub model_path: Option<PathBuf>,
    pub model_url: Option<String>,
    pub tracker_max_lost: usize,
    pub mask_opacity: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let state = state_dir();
        Self {
            workspace_root: state.join("workspace"),
            interrupt_dir: state.join("interrupts"),
            progress_dir: state.join("progress"),
            scale_factor: 1.0,
            confidence: DEFAULT_CONFIDENCE,
            model_path: None,
            model_url: None,
            tracker_max_lost: TRACKER_MAX_LOST,
            mask_opacity: DEFAULT_MASK_OPACITY,
        }
    }
}

/// Per-user directory for run state, falling back to the temp dir.
fn state_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

impl PipelineSettings {
    /// `<config dir>/maskreel/settings.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Loads `explicit` if given (it must exist), else the default path if
    /// present, else defaults. The result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.scale_factor > 0.0 && self.scale_factor <= MAX_SCALE_FACTOR) {
            return Err(SettingsError::Invalid(format!(
                "scale_factor must be in (0, {MAX_SCALE_FACTOR}], got {}",
                self.scale_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(SettingsError::Invalid(format!(
                "confidence must be in [0, 1], got {}",
                self.confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.mask_opacity) {
            return Err(SettingsError::Invalid(format!(
                "mask_opacity must be in [0, 1], got {}",
                self.mask_opacity
            )));
        }
        Ok(())
    }
}
