//! Run orchestration: probe → video → audio → merge, one stage at a time.
//!
//! The working directory and any stale output are removed before a run;
//! `RunGuard` removes the working directory again on every exit path and
//! deletes the output unless the merge completed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::mux_audio;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::{ProgressCallback, Stage};
use crate::ffmpeg::EncodeSettings;
use crate::ffmpeg::discovery::{Tool, Toolchain, resolve_tool};
use crate::ffmpeg::ffprobe::probe_durations;
use crate::ffmpeg::filter_graph::{
    GraphDescription, Segment, build_filter_graph, build_segments, total_duration,
};
use crate::merge::merge_final;
use crate::video::synthesize_video;
use crate::workdir::{RunGuard, WorkDir, remove_stale_file};

/// Everything derived from the probed durations, before any encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub durations: Vec<f64>,
    pub segments: Vec<Segment>,
    pub graph: GraphDescription,
    pub total_duration: f64,
}

/// Either list empty, or fewer images than audio clips, is rejected.
pub fn check_input_counts(audio: &[PathBuf], images: &[PathBuf]) -> Result<(), PipelineError> {
    if audio.is_empty() || images.is_empty() || images.len() < audio.len() {
        return Err(PipelineError::InputCount {
            audio: audio.len(),
            images: images.len(),
        });
    }
    Ok(())
}

fn build_plan(
    ffprobe: &Path,
    audio: &[PathBuf],
    images: &[PathBuf],
    progress: Option<&ProgressCallback>,
) -> Result<RunPlan, PipelineError> {
    let durations = probe_durations(ffprobe, audio, progress)?;
    let segments = build_segments(&images[..audio.len()], &durations);
    let graph = build_filter_graph(&durations);
    let total_duration = total_duration(&durations);
    Ok(RunPlan {
        durations,
        segments,
        graph,
        total_duration,
    })
}

/// Probe and compute segments and the filter graph without encoding anything.
pub fn plan_run(
    audio: &[PathBuf],
    images: &[PathBuf],
    config: &PipelineConfig,
    progress: Option<&ProgressCallback>,
) -> Result<RunPlan, PipelineError> {
    check_input_counts(audio, images)?;
    let ffmpeg_hint = config.ffmpeg_path.as_deref().filter(|p| p.exists());
    let ffprobe = resolve_tool(Tool::Ffprobe, config.ffprobe_path.as_deref(), ffmpeg_hint)?;
    build_plan(&ffprobe, audio, images, progress)
}

/// Produce the final video and return its path.
///
/// `audio[i]` is paired with `images[i]`; extra images are ignored. Progress
/// events arrive synchronously on the calling thread.
pub fn run_pipeline(
    audio: &[PathBuf],
    images: &[PathBuf],
    config: &PipelineConfig,
    progress: Option<ProgressCallback>,
) -> Result<PathBuf, PipelineError> {
    config.validate()?;
    config.validate_inputs(audio)?;
    config.validate_inputs(images)?;
    let work_dir = WorkDir::new(config.effective_work_dir());
    let output_path = config.effective_output_path();

    log::debug!(
        target: "slidecast::pipeline",
        "Cleaning up before run: work_dir={}, output={}",
        work_dir.root().display(),
        output_path.display()
    );
    work_dir.remove().map_err(PipelineError::io(Stage::Setup))?;
    remove_stale_file(&output_path).map_err(PipelineError::io(Stage::Setup))?;

    check_input_counts(audio, images).inspect_err(|e| {
        log::error!(target: "slidecast::pipeline", "{}", e);
    })?;
    if images.len() > audio.len() {
        log::info!(
            target: "slidecast::pipeline",
            "Ignoring {} extra image(s)",
            images.len() - audio.len()
        );
    }

    let tools = Toolchain::resolve(
        config.ffmpeg_path.as_deref(),
        config.ffprobe_path.as_deref(),
    )?;
    let settings = EncodeSettings::default();
    let progress = progress.as_ref();

    work_dir.create().map_err(PipelineError::io(Stage::Setup))?;
    let guard = RunGuard::new(&work_dir, &output_path);

    let plan = build_plan(&tools.ffprobe, audio, images, progress)?;
    log::info!(
        target: "slidecast::pipeline",
        "Total audio duration: {:.2} seconds",
        plan.total_duration
    );

    let video_path = synthesize_video(
        &tools.ffmpeg,
        &plan.segments,
        &plan.graph,
        &work_dir.video_path(),
        &settings,
        progress,
    )?;
    let audio_path = mux_audio(&tools.ffmpeg, audio, &work_dir, &settings, progress)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(PipelineError::io(Stage::Merge))?;
    }
    let final_path = merge_final(
        &tools.ffmpeg,
        &video_path,
        &audio_path,
        plan.total_duration,
        &output_path,
        &settings,
        progress,
    )?;

    guard.commit();
    log::info!(
        target: "slidecast::pipeline",
        "Video created: {}",
        final_path.display()
    );
    Ok(final_path)
}
