pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod ffmpeg;
pub mod merge;
pub mod ordering;
pub mod pipeline;
pub mod video;
pub mod workdir;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use events::{ProgressCallback, ProgressEvent, ProgressRecorder, Stage};
pub use pipeline::{RunPlan, plan_run, run_pipeline};
