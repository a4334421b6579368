use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::PipelineError;
use crate::ordering::AssetOrder;

pub const DEFAULT_WORK_DIR_NAME: &str = "slidecast-work";
pub const DEFAULT_OUTPUT_PATH: &str = "output.mp4";

/// Per-run configuration. Every field is optional; `effective_*` fill defaults.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Directory for intermediate artifacts. Removed before and after each run.
    pub work_dir: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    /// How the command line orders files found in directories.
    pub order: Option<AssetOrder>,
}

impl PipelineConfig {
    pub fn new(work_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: Some(work_dir.into()),
            output_path: Some(output_path.into()),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(json).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let json = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Fields set in `other` replace ours.
    pub fn overlay(mut self, other: PipelineConfig) -> Self {
        if other.work_dir.is_some() {
            self.work_dir = other.work_dir;
        }
        if other.output_path.is_some() {
            self.output_path = other.output_path;
        }
        if other.ffmpeg_path.is_some() {
            self.ffmpeg_path = other.ffmpeg_path;
        }
        if other.ffprobe_path.is_some() {
            self.ffprobe_path = other.ffprobe_path;
        }
        if other.order.is_some() {
            self.order = other.order;
        }
        self
    }

    pub fn effective_work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_WORK_DIR_NAME))
    }

    pub fn effective_output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH))
    }

    pub fn effective_order(&self) -> AssetOrder {
        self.order.unwrap_or_default()
    }

    /// The output must survive the working directory's removal.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let work_dir = normalize(&self.effective_work_dir());
        let output = normalize(&self.effective_output_path());
        if output.starts_with(&work_dir) {
            return Err(PipelineError::Config(format!(
                "output path {} must not be inside the working directory {}",
                output.display(),
                work_dir.display()
            )));
        }
        if work_dir.starts_with(&output) {
            return Err(PipelineError::Config(format!(
                "working directory {} must not be inside the output path {}",
                work_dir.display(),
                output.display()
            )));
        }
        Ok(())
    }

    /// Inputs must not live under the working directory, which is removed
    /// before the run starts.
    pub fn validate_inputs(&self, inputs: &[PathBuf]) -> Result<(), PipelineError> {
        let work_dir = normalize(&self.effective_work_dir());
        match inputs.iter().find(|p| normalize(p).starts_with(&work_dir)) {
            Some(input) => Err(PipelineError::Config(format!(
                "input {} is inside the working directory {}",
                input.display(),
                work_dir.display()
            ))),
            None => Ok(()),
        }
    }
}

/// Absolute form with `.` and `..` resolved lexically.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
