//! Pipeline error type. Implements Display and Serialize for event output.

use std::path::PathBuf;

use crate::events::Stage;
use crate::ffmpeg::{FfmpegErrorPayload, parse_ffmpeg_error};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Could not read duration of {}: {reason}", asset.display())]
    Probe { asset: PathBuf, reason: String },

    #[error("{}", input_count_message(*audio, *images))]
    InputCount { audio: usize, images: usize },

    #[error("Failed to launch {tool}: {reason}")]
    Launch {
        stage: Stage,
        tool: String,
        reason: String,
    },

    #[error("Video creation failed (code {code})")]
    Encode { code: i32, stderr: String },

    #[error("Audio concatenation failed (code {code})")]
    Mux { code: i32, stderr: String },

    #[error("Final merge failed (code {code})")]
    Merge { code: i32, stderr: String },

    #[error("{source}")]
    Io {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn input_count_message(audio: usize, images: usize) -> String {
    if audio == 0 || images == 0 {
        format!(
            "Please provide both audio and image files (got {} audio, {} image).",
            audio, images
        )
    } else {
        format!(
            "Not enough images: {} audio file(s) need at least {} image(s), got {}.",
            audio, audio, images
        )
    }
}

impl PipelineError {
    pub fn io(stage: Stage) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { stage, source }
    }

    pub fn launch(stage: Stage, tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Launch {
            stage,
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Stage in which the error surfaced.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Probe { .. } => Stage::Probe,
            Self::InputCount { .. } | Self::Config(_) => Stage::Setup,
            Self::Launch { stage, .. } | Self::Io { stage, .. } => *stage,
            Self::Encode { .. } => Stage::Video,
            Self::Mux { .. } => Stage::Audio,
            Self::Merge { .. } => Stage::Merge,
        }
    }

    /// Offending asset, when the failure can be pinned to one input file.
    pub fn asset(&self) -> Option<&std::path::Path> {
        match self {
            Self::Probe { asset, .. } => Some(asset),
            _ => None,
        }
    }

    /// Short summary plus expandable detail, for event output.
    pub fn payload(&self) -> FfmpegErrorPayload {
        match self {
            Self::Encode { code, stderr }
            | Self::Mux { code, stderr }
            | Self::Merge { code, stderr } => {
                let parsed = parse_ffmpeg_error(stderr, *code);
                FfmpegErrorPayload {
                    summary: format!("{} {}", self.stage().failure_prefix(), parsed.summary),
                    detail: parsed.detail,
                }
            }
            Self::Io { source, .. } => FfmpegErrorPayload {
                summary: format!("{} {}", self.stage().failure_prefix(), source),
                detail: String::new(),
            },
            _ => FfmpegErrorPayload {
                summary: self.to_string(),
                detail: String::new(),
            },
        }
    }
}

impl serde::Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let payload = self.payload();
        let mut state = serializer.serialize_struct("PipelineError", 4)?;
        state.serialize_field("stage", &self.stage())?;
        state.serialize_field("summary", &payload.summary)?;
        state.serialize_field("detail", &payload.detail)?;
        state.serialize_field("asset", &self.asset())?;
        state.end()
    }
}

/// Failure of a single external process run.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {program} output: {source}")]
    Read {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed (code {code}): {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },
}

impl ProcessError {
    /// Maps a process failure onto the error kind owned by `stage`.
    pub fn into_pipeline_error(self, stage: Stage) -> PipelineError {
        match self {
            Self::Spawn { program, source } => {
                PipelineError::launch(stage, program, source.to_string())
            }
            Self::Read { source, .. } => PipelineError::Io { stage, source },
            Self::Failed { code, stderr, .. } => match stage {
                Stage::Audio => PipelineError::Mux { code, stderr },
                Stage::Merge => PipelineError::Merge { code, stderr },
                _ => PipelineError::Encode { code, stderr },
            },
        }
    }
}
