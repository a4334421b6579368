//! Final audio/video mux into the deliverable.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::events::{ProgressCallback, Stage, StageProgress};
use crate::ffmpeg::{EncodeSettings, TimeProgress, build_merge_args, run_ffmpeg_blocking};

/// Muxes `video_path` and `audio_path` into `output_path`, cut at `total_secs`
/// so audio padding can't make the result longer than the probed clips.
/// A failed merge deletes whatever was written to `output_path`.
pub fn merge_final(
    ffmpeg: &Path,
    video_path: &Path,
    audio_path: &Path,
    total_secs: f64,
    output_path: &Path,
    settings: &EncodeSettings,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf, PipelineError> {
    log::info!(
        target: "slidecast::merge",
        "Merging video and audio into {} ({:.2}s)",
        output_path.display(),
        total_secs
    );

    let args = build_merge_args(video_path, audio_path, total_secs, output_path, settings);
    let mut extractor = TimeProgress::new(total_secs);
    let mut stage = StageProgress::new(Stage::Merge, progress);

    if let Err(e) = run_ffmpeg_blocking(ffmpeg, &args, &mut extractor, |p| stage.report(p)) {
        let _ = fs::remove_file(output_path);
        return Err(e.into_pipeline_error(Stage::Merge));
    }
    stage.finish();
    Ok(output_path.to_path_buf())
}
