//! Silent video synthesis from faded still-image segments.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::events::{ProgressCallback, Stage, StageProgress};
use crate::ffmpeg::filter_graph::{GraphDescription, Segment};
use crate::ffmpeg::{EncodeSettings, FrameProgress, build_video_args, run_ffmpeg_blocking};

/// Renders `segments` through `graph` into `output_path` (video stream only).
///
/// Progress is the current frame over `round(total duration * fps)`.
pub fn synthesize_video(
    ffmpeg: &Path,
    segments: &[Segment],
    graph: &GraphDescription,
    output_path: &Path,
    settings: &EncodeSettings,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf, PipelineError> {
    let total_secs: f64 = segments.iter().map(|s| s.duration).sum();
    log::info!(
        target: "slidecast::video",
        "Creating video from {} image(s), {:.2}s",
        segments.len(),
        total_secs
    );

    let args = build_video_args(segments, graph, output_path, settings);
    let mut extractor = FrameProgress::new(total_secs, settings.fps);
    let mut stage = StageProgress::new(Stage::Video, progress);

    if let Err(e) = run_ffmpeg_blocking(ffmpeg, &args, &mut extractor, |p| stage.report(p)) {
        let _ = fs::remove_file(output_path);
        return Err(e.into_pipeline_error(Stage::Video));
    }
    stage.finish();
    Ok(output_path.to_path_buf())
}
